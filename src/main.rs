mod cli;
mod commands;
mod config;
mod engine;
mod progress;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    pub config: Option<PathBuf>,
    pub profile: Option<String>,
}

impl Context {
    /// Connect to the cluster of the selected profile.
    pub fn client(&self) -> Result<kafkakit::Client> {
        let connection = config::load_connection(self.config.as_deref(), self.profile.as_deref())?;
        log::debug!("connection: {connection:?}");
        Ok(kafkakit::Client::connect(&connection)?)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        quiet: cli.quiet,
        config: cli.config,
        profile: cli.profile,
    };

    let result = match cli.command {
        Command::Topic(cmd) => commands::topic::run(&ctx, cmd),
        Command::Acl(cmd) => commands::acl::run(&ctx, cmd),
        Command::ConsumerGroups(cmd) => commands::consumer_groups::run(&ctx, cmd),
        Command::ConsumerGroupOffsets(cmd) => commands::consumer_group_offsets::run(&ctx, cmd),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "kafka-admin", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(err) = &result {
        explain(err);
    }
    result
}

/// Print the category and advice of a library error before anyhow prints
/// the error chain.
fn explain(err: &anyhow::Error) {
    let Some(kafka_err) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<kafkakit::Error>())
    else {
        return;
    };

    let category = kafka_err.category();
    ui::error(category.description());
    eprintln!("  {}", category.advice());
    if kafka_err.is_retryable() {
        eprintln!("  This may be temporary; running the command again can help.");
    }
    eprintln!();
}
