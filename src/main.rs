//! hoverplay - hover a video link, get an inline player.
//!
//! Command-line front end for the overlay engine: scripted replays against
//! the simulated page plus a few inspection tools.

mod cli;
mod cmd_inspect;
mod replay;

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use hoverplay_protocols::{Rect, Viewport};

use crate::cli::{Cli, Commands};

/// Keeps the non-blocking file writer alive for the whole process.
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Console logging to stderr, plus daily-rotated files when `log_dir` is set.
fn init_tracing(log_dir: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    let file = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("hoverplay")
                .filename_suffix("log")
                .max_log_files(14)
                .build(dir)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = LOG_GUARD.set(guard);
            Some(fmt::layer().with_writer(writer).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_dir.as_deref())?;

    match cli.command {
        Commands::Replay {
            scenario,
            preferences,
        } => {
            let content = fs::read_to_string(&scenario)
                .with_context(|| format!("cannot read {}", scenario.display()))?;
            let scenario = replay::Scenario::from_json(&content)?;
            let base = match preferences {
                Some(path) => {
                    let content = fs::read_to_string(&path)
                        .with_context(|| format!("cannot read {}", path.display()))?;
                    replay::load_base_preferences(Some(&content))?
                }
                None => replay::load_base_preferences(None)?,
            };
            let report = replay::run(scenario, base).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Classify { urls, on_video_host } => {
            for line in cmd_inspect::classify(&urls, on_video_host) {
                println!("{}", line);
            }
        }
        Commands::Place {
            rect,
            viewport,
            scroll,
            scroll_height,
            preferences,
        } => {
            let prefs = cmd_inspect::load_preferences(preferences.as_deref())?;
            let [left, top, width, height] = rect;
            let viewport = Viewport {
                scroll_x: scroll[0],
                scroll_y: scroll[1],
                inner_width: viewport[0],
                inner_height: viewport[1],
                scroll_height: scroll_height.unwrap_or(viewport[1]),
            };
            let placed = cmd_inspect::place(Rect::new(left, top, width, height), viewport, &prefs);
            println!("{}", serde_json::to_string_pretty(&placed)?);
        }
        Commands::DecodeSignature {
            signature,
            algorithm,
        } => {
            println!(
                "{}",
                cmd_inspect::decode_signature(&signature, algorithm.as_deref())?
            );
        }
    }

    info!("Done");
    Ok(())
}
