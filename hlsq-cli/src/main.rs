mod cli;
mod config;
mod error;
mod fetch;
mod input;
mod output;
mod poll;

use crate::{
    cli::{Args, Commands},
    config::AppConfig,
    error::{AppError, Result},
    fetch::ManifestFetcher,
    input::InputSource,
    output::{Colorize, build_serializer, print_manifest},
    poll::Poller,
};
use clap::{CommandFactory, Parser};
use colored::Colorize as _;
use std::{
    io::{self, IsTerminal},
    process,
};
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, error, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        if e.is_broken_pipe() {
            process::exit(0);
        }
        error!("Application error: {}", e);
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    if let Some(Commands::Completions { shell }) = args.command {
        let mut cmd = Args::command();
        let bin_name = cmd.get_name().to_string();
        clap_complete::generate(shell, &mut cmd, bin_name, &mut io::stdout());
        return Ok(());
    }

    init_logging(args.verbose, args.quiet)?;

    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_args(&args);
    config.validate()?;
    debug!(?config, "Effective configuration");

    let colors = config
        .colors
        .enabled
        .then(|| Colorize::new(config.colors.tag, config.colors.attr));
    // Bad queries must fail before anything is read or printed.
    let serializer = build_serializer(args.query.as_deref(), args.chomp, colors)?;

    let source = InputSource::resolve(args.input.as_deref(), io::stdin().is_terminal())?;
    if args.poll && !source.is_url() {
        return Err(AppError::InvalidInput(
            "--poll requires an http(s) URL as INPUT".to_string(),
        ));
    }

    let mut out = io::stdout().lock();
    match source {
        InputSource::Url(url) => {
            let fetcher = ManifestFetcher::new(&config.fetch)?;
            if args.poll {
                let token = CancellationToken::new();
                let ctrl_c_token = token.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("Ctrl-C received. Shutting down gracefully...");
                        ctrl_c_token.cancel();
                    }
                });

                let mut poller = Poller::new(fetcher, serializer, &config.poll);
                poller.run(&url, &mut out, token).await?;
            } else {
                let body = fetcher.fetch(&url).await?;
                print_manifest(body.as_bytes(), &serializer, &mut out)?;
            }
        }
        source => {
            let reader = source.open()?;
            print_manifest(reader, &serializer, &mut out)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::builder()
            .with_default_directive(Level::WARN.into())
            .from_env_lossy()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .try_init()
        .map_err(|e| AppError::Config(format!("failed to initialize logging: {e}")))?;
    Ok(())
}
