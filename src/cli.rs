//! Command-line interface definitions for campus_press.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The backend URL can also come from the environment or the config file.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Markdown,
    Json,
}

/// Command-line arguments for campus_press.
///
/// # Examples
///
/// ```sh
/// # Front page from a live backend
/// campus_press --api-url https://cms.example.edu/api
///
/// # Two pages of sports coverage and the newsletter archive, as JSON
/// campus_press -a https://cms.example.edu/api -p 2 -f json /sports /newsletters
///
/// # Offline, from a fixture file
/// campus_press --fixtures ./fixtures.yml /author/Sam%20Ortiz
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Site paths to render, e.g. `/sports`, `/article/<id>`, `/about`
    #[arg(default_value = "/")]
    pub paths: Vec<String>,

    /// Base URL of the collection backend
    #[arg(short, long, env = "CAMPUS_PRESS_API_URL")]
    pub api_url: Option<String>,

    /// Serve collections from a YAML/JSON fixture file instead of a backend (takes precedence over --api-url)
    #[arg(long)]
    pub fixtures: Option<PathBuf>,

    /// Optional path to config.yml (default: ~/.campus_press/config.yml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of pages to fetch per listing ("load more" is requested pages - 1 times)
    #[arg(short, long, default_value_t = 1)]
    pub pages: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,

    /// Write output to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Retries for failed backend requests
    #[arg(long)]
    pub max_retries: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["campus_press", "--fixtures", "f.yml"]);
        assert_eq!(cli.paths, vec!["/"]);
        assert_eq!(cli.pages, 1);
        assert_eq!(cli.format, OutputFormat::Markdown);
        assert_eq!(cli.fixtures, Some(PathBuf::from("f.yml")));
        assert_eq!(cli.output, None);
    }

    #[test]
    fn test_cli_short_flags_and_paths() {
        let cli = Cli::parse_from([
            "campus_press",
            "-a",
            "https://cms.example.edu/api",
            "-p",
            "3",
            "-f",
            "json",
            "-o",
            "/tmp/out.json",
            "/sports",
            "/newsletters",
        ]);

        assert_eq!(cli.api_url.as_deref(), Some("https://cms.example.edu/api"));
        assert_eq!(cli.pages, 3);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.output, Some(PathBuf::from("/tmp/out.json")));
        assert_eq!(cli.paths, vec!["/sports", "/newsletters"]);
    }
}
