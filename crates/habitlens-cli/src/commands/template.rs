//! Schedule template command for CLI.

use std::path::Path;

use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::input::load_config;

#[derive(Clone, Copy, ValueEnum)]
pub enum TemplateFormat {
    Json,
    Toml,
}

#[derive(Args)]
pub struct TemplateArgs {
    #[arg(long, value_enum, default_value_t = TemplateFormat::Json)]
    pub format: TemplateFormat,
}

#[derive(Serialize)]
struct TemplateDoc<'a> {
    template: &'a [habitlens_core::TemplateEntry],
}

pub fn run(args: TemplateArgs, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let doc = TemplateDoc {
        template: &config.schedule.template,
    };
    match args.format {
        TemplateFormat::Json => println!("{}", serde_json::to_string_pretty(&doc)?),
        TemplateFormat::Toml => print!("{}", toml::to_string_pretty(&doc)?),
    }
    Ok(())
}
