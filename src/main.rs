//! rbf-insight - Main Entry Point

use clap::Parser;
use rbf_insight::cli::{cmd_cv, cmd_evaluate, cmd_explain, cmd_importance, cmd_train, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rbf_insight=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, target, name, store, config, hidden, epochs, lr, seed } => {
            cmd_train(&data, &target, &name, &store, config.as_deref(), hidden, epochs, lr, seed)?;
        }
        Commands::Evaluate { data, target, name, store, threshold, sweep } => {
            cmd_evaluate(&data, &target, &name, &store, threshold, sweep)?;
        }
        Commands::Explain { data, target, name, store, row } => {
            cmd_explain(&data, target.as_deref(), &name, &store, row)?;
        }
        Commands::Importance { data, target, name, store, replacement } => {
            cmd_importance(&data, target.as_deref(), &name, &store, replacement)?;
        }
        Commands::Cv {
            data, target, config, folds, start, end, step, epochs, lr, seed, per_fold, sequential,
        } => {
            cmd_cv(
                &data, &target, config.as_deref(), folds, start, end, step, epochs, lr, seed,
                per_fold, sequential,
            )?;
        }
    }

    Ok(())
}
