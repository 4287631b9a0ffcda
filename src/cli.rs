//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Crawl a comic from the site, resume where the last run stopped, and zip
/// it once every chapter is downloaded.
#[derive(Parser, Debug)]
#[command(name = "comic-crawler")]
#[command(author, version, about)]
pub struct Args {
    /// Comic to crawl: a path such as `/book/499` or an absolute URL
    pub comic: Option<String>,

    /// Site root that relative comic paths and page links resolve against
    #[arg(long)]
    pub base_url: Option<String>,

    /// Progress database file
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Directory comics are downloaded into
    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    /// Directory finished comic archives are written to
    #[arg(long)]
    pub archive_dir: Option<PathBuf>,

    /// Config file (default: $XDG_CONFIG_HOME/comic-crawler/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Keep progress in memory only; nothing is skipped on the next run
    #[arg(long)]
    pub no_persist: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["comic-crawler"]).unwrap();
        assert_eq!(args.comic, None);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(!args.no_persist);
    }

    #[test]
    fn test_cli_positional_comic() {
        let args = Args::try_parse_from(["comic-crawler", "/book/499"]).unwrap();
        assert_eq!(args.comic.as_deref(), Some("/book/499"));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["comic-crawler", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["comic-crawler", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["comic-crawler", "--quiet"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_path_flags() {
        let args = Args::try_parse_from([
            "comic-crawler",
            "--database",
            "state/p.db",
            "--download-dir",
            "dl",
            "--archive-dir",
            "zips",
            "--config",
            "c.toml",
            "--base-url",
            "https://m.example.com",
        ])
        .unwrap();
        assert_eq!(args.database, Some(PathBuf::from("state/p.db")));
        assert_eq!(args.download_dir, Some(PathBuf::from("dl")));
        assert_eq!(args.archive_dir, Some(PathBuf::from("zips")));
        assert_eq!(args.config, Some(PathBuf::from("c.toml")));
        assert_eq!(args.base_url.as_deref(), Some("https://m.example.com"));
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["comic-crawler", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["comic-crawler", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
