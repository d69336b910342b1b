//! pacsmith - Arch package repository host
//!
//! Serves per-architecture package databases and watches the AUR for updates
//! of tracked packages, requesting builds when they appear.

mod cli;
mod display;
mod error;
mod logging;
mod setup;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::{OperationResult, OutputRenderer};
use crate::error::CliError;
use crate::setup::Context;
use clap::Parser;
use pacsmith_checker::{publish, RepoStore};
use pacsmith_config::Config;
use pacsmith_events::EventReceiver;
use pacsmith_types::{RepoRecord, Version};
use std::process;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting pacsmith v{}", env!("CARGO_PKG_VERSION"));

    // file, then environment, then flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global, &cli.command);
    config.validate()?;

    let (event_sender, event_receiver) = pacsmith_events::channel();
    let ctx = Context::initialize(config, event_sender).await?;

    let renderer = OutputRenderer::new(cli.global.json);
    let result = execute_command_with_events(cli.command, &ctx, event_receiver).await?;
    renderer.render_result(&result)?;

    info!("Command completed successfully");
    Ok(())
}

/// Execute command while forwarding its events to tracing
async fn execute_command_with_events(
    command: Commands,
    ctx: &Context,
    mut event_receiver: EventReceiver,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ctx));

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(event) = event_receiver.try_recv() {
                    logging::log_event_with_tracing(&event);
                }
                return result;
            }

            Some(event) = event_receiver.recv() => {
                logging::log_event_with_tracing(&event);
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(command: Commands, ctx: &Context) -> Result<OperationResult, CliError> {
    match command {
        Commands::Init {
            repo,
            archs,
            source,
            source_branch,
            build_branch,
            private,
        } => {
            let archs = if archs.is_empty() {
                ctx.config().storage.default_archs.clone()
            } else {
                archs
            };
            let source = source.unwrap_or_else(|| repo.clone());
            let record = RepoRecord {
                owner: repo.owner.clone(),
                name: repo.name.clone(),
                archs,
                private,
                source_owner: source.owner,
                source_name: source.name,
                source_branch,
                build_branch,
                last_check: None,
            };

            // validates the name and archs before anything is persisted
            let handle = ctx.registry().repository(&record)?;
            ctx.store().create(record).await?;
            handle.init_dir().await?;
            handle.init_empty_dbs().await?;
            Ok(OperationResult::Success(format!("Initialized {repo}")))
        }

        Commands::Add { repo, files, force } => {
            let handle = ctx.repository(&repo).await?;
            if force {
                handle.add(&files).await?;
                return Ok(OperationResult::Published {
                    added: files.iter().map(|f| f.display().to_string()).collect(),
                    rejected: Vec::new(),
                });
            }
            let report = publish(&handle, ctx.state(), &files, ctx.event_sender()).await?;
            Ok(report.into())
        }

        Commands::Remove { repo, arch, names } => {
            let handle = ctx.repository(&repo).await?;
            let deleted = handle.remove(&names, arch).await?;
            Ok(OperationResult::removed(&deleted))
        }

        Commands::List { repo, arch, files } => {
            let handle = ctx.repository(&repo).await?;
            Ok(OperationResult::PackageList(handle.packages(arch, files).await?))
        }

        Commands::Show {
            repo,
            package,
            arch,
            files,
        } => {
            let handle = ctx.repository(&repo).await?;
            match handle.package(&package, arch, files).await? {
                Some(found) => Ok(OperationResult::PackageInfo(found)),
                None => Err(CliError::PackageNotFound {
                    package,
                    location: format!("{repo} ({arch})"),
                }),
            }
        }

        Commands::IsNew {
            repo,
            target,
            version,
            arch,
        } => {
            let handle = ctx.repository(&repo).await?;
            let new = match version {
                Some(version) => {
                    let version = Version::parse(&version)?;
                    handle.is_new(&target, arch, &version).await?
                }
                None => handle.is_new_filename(&target).await?,
            };
            Ok(OperationResult::IsNew {
                package: target,
                new,
            })
        }

        Commands::Obsolete { repo, arch, keep } => {
            let handle = ctx.repository(&repo).await?;
            Ok(OperationResult::Names(handle.obsolete(&keep, arch).await?))
        }

        Commands::Delete { repo } => {
            let handle = ctx.repository(&repo).await?;
            handle.clear_path().await?;
            ctx.store().delete(&repo).await?;
            ctx.registry().forget(&repo);
            Ok(OperationResult::Success(format!("Deleted {repo}")))
        }

        Commands::Repos => Ok(OperationResult::Repositories(ctx.store().list().await?)),

        Commands::Check => {
            let summary = ctx.checker()?.check_all().await;
            Ok(summary.into())
        }

        Commands::Run { .. } => {
            if !ctx.config().checker.enabled {
                return Err(CliError::InvalidArguments(
                    "the update checker is disabled; pass --check or set PACSMITH_CHECK=true"
                        .to_string(),
                ));
            }
            let checker = ctx.checker()?;
            checker
                .run(async {
                    // a failed signal handler ends the loop as well
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await;
            Ok(OperationResult::Success("Checker stopped".to_string()))
        }
    }
}

/// Initialize tracing/logging
///
/// Logs go to stderr so command output on stdout stays parseable.
fn init_tracing(json_mode: bool, debug_enabled: bool) {
    let default_filter = if debug_enabled {
        "debug,pacsmith=debug"
    } else {
        "info,pacsmith=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if json_mode {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &GlobalArgs, command: &Commands) {
    if let Some(storage) = &global.storage {
        config.storage.path.clone_from(storage);
    }

    if let Commands::Run { check: true } = command {
        config.checker.enabled = true;
    }
}
