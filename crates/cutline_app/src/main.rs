// SPDX-License-Identifier: MIT OR Apache-2.0
//! `cutline` project inspector.
//!
//! Loads a project file, repairs what it can, validates clip references
//! and lane rules, and logs a summary.
//!
//! Usage: `cutline <project.json> [--config file.ron]`

use cutline_app::{EditorConfig, EditorState, ProjectError};
use cutline_sequencer::ClipIssue;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const USAGE: &str = "usage: cutline <project.json> [--config file.ron]";

struct Args {
    project: PathBuf,
    config: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut project = None;
    let mut config = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            _ if project.is_none() => project = Some(PathBuf::from(arg)),
            _ => return Err(format!("unexpected argument: {arg}")),
        }
    }
    let project = project.ok_or_else(|| USAGE.to_string())?;
    Ok(Args { project, config })
}

fn inspect(args: &Args) -> Result<usize, ProjectError> {
    let config = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    let state = EditorState::load_project(&args.project, config)?;
    let timeline = state.timeline();

    tracing::info!(
        media = state.catalog().len(),
        clips = timeline.tracks().clip_count(),
        audio_lanes = timeline.tracks().audio.len(),
        duration = timeline.duration(),
        "Project summary"
    );

    let issues = state.validate();
    for issue in &issues {
        match issue {
            ClipIssue::MissingMedia(clip) => tracing::warn!(%clip, "Clip references missing media"),
            ClipIssue::ExceedsMedia { clip_id, overflow } => {
                tracing::warn!(clip = %clip_id, overflow, "Clip runs past the end of its media");
            }
            ClipIssue::Overlap {
                lane,
                first,
                second,
            } => tracing::warn!(lane, %first, %second, "Clips overlap in audio lane"),
        }
    }
    Ok(issues.len())
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cutline_app=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Cutline v{}", env!("CARGO_PKG_VERSION"));

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };

    match inspect(&args) {
        Ok(0) => tracing::info!("No issues found"),
        Ok(count) => tracing::warn!(count, "Project has issues"),
        Err(e) => {
            tracing::error!("Failed to inspect {}: {e}", args.project.display());
            std::process::exit(1);
        }
    }
}
