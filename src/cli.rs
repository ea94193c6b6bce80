//! Command-line interface parsing for the headliner daemon
//!
//! This module handles parsing of CLI arguments using clap: the subscriber
//! seed file, the refresh period override, and one-shot sweep mode.

use std::path::PathBuf;

use clap::Parser;

/// Headliner - personalized news aggregation and cache warming
#[derive(Parser, Debug)]
#[command(name = "headliner")]
#[command(about = "Keeps per-subscriber news caches warm against the upstream provider")]
#[command(version)]
pub struct Cli {
    /// JSON file of subscriber preference records to seed the directory
    ///
    /// Format:
    ///   [{"subscriberId": "u1", "categories": ["business"], "sources": ["bbc-news"]}]
    ///
    /// Without this flag the daemon starts with an empty directory and
    /// sweeps do nothing until subscribers are added.
    #[arg(long, value_name = "FILE")]
    pub subscribers: Option<PathBuf>,

    /// Seconds between cache sweeps (overrides NEWS_REFRESH_SECS)
    ///
    /// Use 300 for the always-on variant or 86400 for a once-daily sweep.
    #[arg(long, value_name = "SECONDS")]
    pub refresh_secs: Option<u64>,

    /// Run a single sweep and exit instead of staying resident
    #[arg(long)]
    pub once: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["headliner"]);
        assert!(cli.subscribers.is_none());
        assert!(cli.refresh_secs.is_none());
        assert!(!cli.once);
    }

    #[test]
    fn test_cli_parse_subscribers_path() {
        let cli = Cli::parse_from(["headliner", "--subscribers", "subs.json"]);
        assert_eq!(cli.subscribers, Some(PathBuf::from("subs.json")));
    }

    #[test]
    fn test_cli_parse_refresh_secs() {
        let cli = Cli::parse_from(["headliner", "--refresh-secs", "86400"]);
        assert_eq!(cli.refresh_secs, Some(86400));
    }

    #[test]
    fn test_cli_parse_once_flag() {
        let cli = Cli::parse_from(["headliner", "--once"]);
        assert!(cli.once);
    }

    #[test]
    fn test_cli_rejects_non_numeric_refresh_secs() {
        let result = Cli::try_parse_from(["headliner", "--refresh-secs", "soon"]);
        assert!(result.is_err());
    }
}
