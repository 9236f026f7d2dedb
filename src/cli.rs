//! CLI definitions for hoverplay.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// hoverplay CLI.
#[derive(Parser)]
#[command(name = "hoverplay")]
#[command(about = "Hover a video link, get an inline player")]
#[command(version)]
pub(crate) struct Cli {
    /// Also write logs to daily-rotated files in this directory
    #[arg(long, env = "HOVERPLAY_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Replay a scripted scenario against the simulated page
    Replay {
        /// Scenario file (JSON)
        scenario: PathBuf,

        /// Preferences file (JSON) applied under the scenario's own preferences
        #[arg(short, long)]
        preferences: Option<PathBuf>,
    },

    /// Classify video URLs
    Classify {
        /// Absolute URLs to classify
        #[arg(required = true)]
        urls: Vec<String>,

        /// Print embed URLs for the video-hosting site (wrapper frame)
        #[arg(long)]
        on_video_host: bool,
    },

    /// Compute where an overlay anchored below a link would be placed
    Place {
        /// Link bounding rectangle: left,top,width,height (client pixels)
        #[arg(long, value_parser = parse_rect)]
        rect: [f64; 4],

        /// Viewport: width,height
        #[arg(long, value_parser = parse_pair, default_value = "1280,720")]
        viewport: [f64; 2],

        /// Window scroll offset: x,y
        #[arg(long, value_parser = parse_pair, default_value = "0,0")]
        scroll: [f64; 2],

        /// Scroll height of the document
        #[arg(long)]
        scroll_height: Option<f64>,

        /// Preferences file (JSON)
        #[arg(short, long)]
        preferences: Option<PathBuf>,
    },

    /// Unscramble a stream signature
    DecodeSignature {
        signature: String,

        /// Algorithm file (JSON); the built-in first version otherwise
        #[arg(long)]
        algorithm: Option<PathBuf>,
    },
}

fn parse_numbers<const N: usize>(value: &str) -> Result<[f64; N], String> {
    let numbers: Vec<f64> = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid number in '{}': {}", value, e))?;
    numbers
        .try_into()
        .map_err(|_| format!("expected {} comma-separated numbers, got '{}'", N, value))
}

fn parse_rect(value: &str) -> Result<[f64; 4], String> {
    parse_numbers::<4>(value)
}

fn parse_pair(value: &str) -> Result<[f64; 2], String> {
    parse_numbers::<2>(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rect() {
        assert_eq!(parse_rect("10, 20,300,40").unwrap(), [10.0, 20.0, 300.0, 40.0]);
        assert!(parse_rect("10,20").is_err());
        assert!(parse_rect("a,b,c,d").is_err());
    }

    #[test]
    fn test_place_args() {
        let cli = Cli::try_parse_from([
            "hoverplay",
            "place",
            "--rect",
            "100,100,200,20",
            "--viewport",
            "1600,900",
        ])
        .unwrap();
        match cli.command {
            Commands::Place { rect, viewport, scroll, .. } => {
                assert_eq!(rect, [100.0, 100.0, 200.0, 20.0]);
                assert_eq!(viewport, [1600.0, 900.0]);
                assert_eq!(scroll, [0.0, 0.0]);
            }
            _ => panic!("expected place"),
        }
    }

    #[test]
    fn test_classify_requires_urls() {
        assert!(Cli::try_parse_from(["hoverplay", "classify"]).is_err());
    }
}
