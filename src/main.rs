//! inkpress - A static site generator for markdown blogs.

mod build;
mod cli;
mod compiler;
mod config;
mod content;
mod error;
mod logger;
mod manifest;
mod render;
mod serve;
mod template;
mod utils;
mod watch;

use anyhow::Result;
use build::build_site;
use clap::Parser;
use cli::Cli;
use config::{SiteConfig, cfg, init_config};
use serve::serve_site;
use std::process::ExitCode;
use utils::signal;

fn main() -> Result<ExitCode> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    init_config(SiteConfig::load(cli)?);
    signal::install()?;

    let report = build_site(&cfg(), signal::interrupted())?;

    if cli.is_serve() && report.cancelled == 0 {
        serve_site()?;
        return Ok(ExitCode::SUCCESS);
    }
    Ok(ExitCode::from(report.exit_code()))
}
