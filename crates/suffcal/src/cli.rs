//! Command-line interface definition using clap.
//!
//! Every setting can also come from the environment (or a `.env` file),
//! which is how the container image is configured.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::warn;

use suffcal_adapters::chat::{DEFAULT_MODEL, OPENROUTER_API_URL};
use suffcal_adapters::tesseract::DEFAULT_LANGUAGE;
use suffcal_models::MediaType;
use suffcal_runtime::config::{DEFAULT_MAX_DOWNLOADS, DEFAULT_POLL_INTERVAL};

use crate::error::{AppError, Result};

/// Default storage root for downloaded photos.
pub const DEFAULT_CACHE_PATH: &str = "./downloads/instagram";

/// Suffcal - update your calendar from posted event flyers
#[derive(Parser, Debug)]
#[command(name = "suffcal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub media: MediaArgs,

    #[command(flatten)]
    pub calendar: CalendarArgs,

    #[command(flatten)]
    pub extraction: ExtractionArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Track the account and forward new events (default)
    Run {
        /// Only process what is already downloaded, then exit
        #[arg(long)]
        once: bool,
    },

    /// Extract events from a single image and print them
    Extract {
        /// Image to read
        #[arg(required = true)]
        image: PathBuf,

        /// Print events as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-extract every processed photo and print the events
    Reprocess,

    /// Verify that external tools and settings are present, then exit
    Check,
}

/// Media network settings.
#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Media network")]
pub struct MediaArgs {
    /// Account whose posts are tracked
    #[arg(long, env = "INSTA_TARGET_USER")]
    pub insta_target_user: Option<String>,

    /// Login user
    #[arg(long, env = "INSTA_USER")]
    pub insta_user: Option<String>,

    /// Login password
    #[arg(long, env = "INSTA_PASSWORD", hide_env_values = true)]
    pub insta_password: Option<String>,

    /// Minutes between update cycles
    #[arg(long = "update-interval", env = "INSTA_UPDATE_INTERVAL", default_value = "240")]
    pub update_interval: String,

    /// Directory for downloaded photos
    #[arg(long, env = "INSTA_CACHE_PATH", default_value = DEFAULT_CACHE_PATH)]
    pub insta_cache_path: String,

    /// Maximum downloads per update cycle
    #[arg(long, env = "MAX_DOWNLOADS", default_value_t = DEFAULT_MAX_DOWNLOADS)]
    pub max_downloads: usize,

    /// Kind of post to download (photo, video, album)
    #[arg(long, env = "MEDIA_TYPE", default_value_t = MediaType::Photo)]
    pub media_type: MediaType,

    /// Base URL of the media bridge service
    #[arg(long, env = "MEDIA_BRIDGE_URL", default_value = suffcal_adapters::bridge::DEFAULT_BRIDGE_URL)]
    pub media_bridge_url: String,

    /// Do not poll in the background
    #[arg(long)]
    pub no_auto_update: bool,
}

/// Calendar settings.
#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Calendar")]
pub struct CalendarArgs {
    /// CalDAV collection URL of the calendar to update
    #[arg(long, env = "CALENDAR_URL")]
    pub calendar_url: Option<String>,

    /// Calendar user
    #[arg(long, env = "CALENDAR_USER")]
    pub calendar_user: Option<String>,

    /// Calendar password
    #[arg(long, env = "CALENDAR_PASSWORD", hide_env_values = true)]
    pub calendar_password: Option<String>,
}

/// OCR and language model settings.
#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Extraction")]
pub struct ExtractionArgs {
    /// Chat completions endpoint
    #[arg(long, env = "LLM_API_URL", default_value = OPENROUTER_API_URL)]
    pub llm_api_url: String,

    /// API key for the completions endpoint
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Model name
    #[arg(long, env = "LLM_MODEL", default_value = DEFAULT_MODEL)]
    pub llm_model: String,

    /// Tesseract language
    #[arg(long, env = "OCR_LANG", default_value = DEFAULT_LANGUAGE)]
    pub ocr_lang: String,
}

impl Cli {
    /// Returns the command to run.
    pub fn subcommand(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run { once: false })
    }

    /// Returns the tracing filter directive based on verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "suffcal=info,warn",
            1 => "suffcal=debug,info",
            2 => "suffcal=trace,info",
            _ => "trace",
        }
    }
}

impl MediaArgs {
    /// Returns the update interval, falling back to the default on invalid
    /// input.
    pub fn poll_interval(&self) -> Duration {
        let seconds = self
            .update_interval
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|minutes| *minutes > 0)
            .and_then(|minutes| minutes.checked_mul(60));
        match seconds {
            Some(seconds) => Duration::from_secs(seconds),
            None => {
                warn!(
                    value = %self.update_interval,
                    "invalid update interval, falling back to 240 minutes"
                );
                DEFAULT_POLL_INTERVAL
            }
        }
    }

    /// Returns the storage root with `~` and variables expanded.
    pub fn storage_root(&self) -> PathBuf {
        let expanded = shellexpand::full(&self.insta_cache_path)
            .map(|path| path.into_owned())
            .unwrap_or_else(|_| shellexpand::tilde(&self.insta_cache_path).into_owned());
        PathBuf::from(expanded)
    }

    /// Returns target user, login user and password.
    pub fn credentials(&self) -> Result<(&str, &str, &str)> {
        Ok((
            required(&self.insta_target_user, "INSTA_TARGET_USER")?,
            required(&self.insta_user, "INSTA_USER")?,
            required(&self.insta_password, "INSTA_PASSWORD")?,
        ))
    }
}

impl CalendarArgs {
    /// Returns URL, user and password.
    pub fn settings(&self) -> Result<(&str, &str, &str)> {
        Ok((
            required(&self.calendar_url, "CALENDAR_URL")?,
            required(&self.calendar_user, "CALENDAR_USER")?,
            required(&self.calendar_password, "CALENDAR_PASSWORD")?,
        ))
    }
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AppError::MissingSetting(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("suffcal").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_parse_no_args() {
        let cli = parse(&[]);
        assert!(cli.command.is_none());
        assert_eq!(cli.subcommand(), Commands::Run { once: false });
    }

    #[test]
    fn test_cli_parse_extract() {
        let cli = parse(&["extract", "flyer.jpg", "--json"]);
        assert_eq!(
            cli.subcommand(),
            Commands::Extract {
                image: PathBuf::from("flyer.jpg"),
                json: true
            }
        );
    }

    #[test]
    fn test_cli_settings() {
        let cli = parse(&[
            "--insta-target-user",
            "kulturhaus",
            "--insta-user",
            "me",
            "--insta-password",
            "secret",
            "--update-interval",
            "30",
            "--media-type",
            "album",
            "run",
            "--once",
        ]);

        assert_eq!(cli.media.credentials().unwrap(), ("kulturhaus", "me", "secret"));
        assert_eq!(cli.media.poll_interval(), Duration::from_secs(30 * 60));
        assert_eq!(cli.media.media_type, MediaType::Album);
        assert_eq!(cli.subcommand(), Commands::Run { once: true });
    }

    #[test]
    fn test_invalid_interval_falls_back() {
        let mut cli = parse(&[]);
        cli.media.update_interval = "soon".into();
        assert_eq!(cli.media.poll_interval(), DEFAULT_POLL_INTERVAL);

        cli.media.update_interval = "0".into();
        assert_eq!(cli.media.poll_interval(), DEFAULT_POLL_INTERVAL);

        cli.media.update_interval = "307445734561825861".into();
        assert_eq!(cli.media.poll_interval(), DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_missing_setting() {
        let mut cli = parse(&[]);
        cli.calendar.calendar_url = Some("https://dav.example.org/cal/".into());
        cli.calendar.calendar_user = Some("  ".into());

        let err = cli.calendar.settings().unwrap_err();
        assert!(matches!(err, AppError::MissingSetting("CALENDAR_USER")));
    }

    #[test]
    fn test_storage_root_expands_home() {
        let mut cli = parse(&[]);
        cli.media.insta_cache_path = "~/suffcal".into();
        assert!(!cli.media.storage_root().starts_with("~"));
    }

    #[test]
    fn test_cli_verbose() {
        let cli = parse(&["-vv"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_filter(), "suffcal=trace,info");
    }

    #[test]
    fn test_cli_help() {
        Cli::command().debug_assert();
    }
}
