use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "shorts-collector",
    about = "Shorts Collector - Gather metadata and transcripts for every short on a YouTube channel",
    version,
    long_about = "Collects title, views, likes, release date and transcript for a channel's shorts. The collect command uses hosted Apify actors with ordered fallback; the free command uses yt-dlp captions with a local whisper fallback."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect shorts data through hosted extraction providers
    Collect {
        /// Channel URL or @handle (prompted for when omitted)
        #[arg(value_name = "CHANNEL")]
        channel: Option<String>,

        /// Apify API token (prompted for when neither this nor the config has one)
        #[arg(long, env = "APIFY_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Output JSON file (defaults to <handle>_shorts_data.json)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Collect shorts data locally with yt-dlp captions and whisper
    Free {
        /// Channel URL or @handle (prompted for when omitted)
        #[arg(value_name = "CHANNEL")]
        channel: Option<String>,

        /// Output JSON file (defaults to <handle>_shorts_data.json)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Whisper model used for videos without captions
        #[arg(long, value_name = "MODEL")]
        whisper_model: Option<String>,

        /// Skip the speech-to-text fallback
        #[arg(long)]
        no_whisper: bool,

        /// Pass browser cookies to yt-dlp (e.g. chrome, firefox)
        #[arg(long, value_name = "BROWSER")]
        cookies_from_browser: Option<String>,
    },

    /// List extraction providers in the order they are tried
    Providers,

    /// Show or locate the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_free_with_flags() {
        let cli = Cli::try_parse_from([
            "shorts-collector",
            "free",
            "@zehuman0",
            "--no-whisper",
            "--cookies-from-browser",
            "firefox",
            "-q",
        ])
        .unwrap();

        assert!(cli.quiet);
        match cli.command {
            Commands::Free {
                channel,
                no_whisper,
                cookies_from_browser,
                whisper_model,
                ..
            } => {
                assert_eq!(channel.as_deref(), Some("@zehuman0"));
                assert!(no_whisper);
                assert_eq!(cookies_from_browser.as_deref(), Some("firefox"));
                assert_eq!(whisper_model, None);
            }
            _ => panic!("expected free command"),
        }
    }

    #[test]
    fn test_parse_collect_output() {
        let cli = Cli::try_parse_from([
            "shorts-collector",
            "collect",
            "https://www.youtube.com/@c/shorts",
            "--output",
            "out.json",
        ])
        .unwrap();

        match cli.command {
            Commands::Collect { channel, output, .. } => {
                assert_eq!(channel.as_deref(), Some("https://www.youtube.com/@c/shorts"));
                assert_eq!(output, Some(PathBuf::from("out.json")));
            }
            _ => panic!("expected collect command"),
        }
    }
}
