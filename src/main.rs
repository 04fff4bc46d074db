//! rsx - compiler front end for composite source documents.

mod cli;
mod compiler;
mod config;
mod document;
mod serve;
mod service;
mod syntax;
mod utils;
mod watch;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::{RsxConfig, init_config};
use serve::serve_project;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config = RsxConfig::load(cli)?;

    // The editor service runs in projects that may not have a config
    // file yet; everything else needs a valid one.
    match &cli.command {
        Commands::Build { .. } | Commands::Serve { .. } => config.validate()?,
        Commands::Lsp => {}
    }
    init_config(config);

    match &cli.command {
        Commands::Build { .. } => compiler::build(),
        Commands::Serve { .. } => {
            compiler::build()?;
            serve_project()
        }
        Commands::Lsp => service::run(),
    }
}
