pub mod completions;
pub mod config;
pub mod recommend;
pub mod schedule;
pub mod template;
