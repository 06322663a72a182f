mod args;
mod ledger;
mod op;
mod ops;
mod state;

use std::str::FromStr;

use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{
    Append, Create, Delete, DeleteCounter, Get, Init, List, Store, Update, Versions, Whoami,
};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::state::AppState;

command_enum! {
    (Init, Init),
    (Whoami, Whoami),
    (Create, Create),
    (Append, Append),
    (Update, Update),
    (Delete, Delete),
    (DeleteCounter, DeleteCounter),
    (Get, Get),
    (Versions, Versions),
    (List, List),
    (Store, Store),
}

/// Log to stderr, and to a daily file once the app directory exists
///
/// Stdout carries command output only.
fn init_logging(state: Option<&AppState>) -> Vec<tracing_appender::non_blocking::WorkerGuard> {
    let mut guards = Vec::new();

    let level = state
        .and_then(|state| LevelFilter::from_str(&state.config.log_level).ok())
        .unwrap_or(LevelFilter::WARN);

    let (stderr_writer, stderr_guard) = tracing_appender::non_blocking(std::io::stderr());
    guards.push(stderr_guard);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stderr_writer)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        );

    match state {
        Some(state) if state.log_path.is_dir() => {
            let file_appender = tracing_appender::rolling::daily(&state.log_path, "byte-store.log");
            let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
            guards.push(file_guard);

            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_filter(
                    EnvFilter::builder()
                        .with_default_directive(level.into())
                        .from_env_lossy(),
                );

            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .init();
        }
        _ => {
            tracing_subscriber::registry().with(stderr_layer).init();
        }
    }

    guards
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let state = AppState::load(args.config_path.clone()).ok();
    let guards = init_logging(state.as_ref());

    let ctx = op::OpContext::new(args.config_path);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            1
        }
    };

    // flush the non-blocking writers before exiting
    drop(guards);
    std::process::exit(code);
}
