//! Command-line definitions and configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use cogniclause_core::LevelFilter;
use cogniclause_core::history::DEFAULT_PAGE_SIZE;
use cogniclause_session::SessionConfig;

#[derive(Parser, Debug)]
#[command(
    name = "cogniclause",
    version,
    about = "Clause-level risk assessment for contracts"
)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    /// Print results as JSON instead of cards
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate pasted contract text
    Evaluate {
        /// Contract text; read from stdin when omitted or with --stdin
        text: Option<String>,

        /// Read contract text from stdin
        #[arg(long, conflicts_with = "text")]
        stdin: bool,
    },

    /// Upload a PDF or Word document for evaluation
    Upload {
        /// Document to upload
        file: PathBuf,
    },

    /// Browse past evaluations
    History {
        /// Case-insensitive search over name and text
        #[arg(short, long, default_value = "")]
        search: String,

        /// Risk level filter: All, Low, Medium, High, Unknown
        #[arg(short, long, default_value = "All")]
        level: LevelFilter,

        /// Page to show (1-based, clamped to the last page)
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Records per page
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
    },

    /// Check that the evaluation service is up
    Health,

    /// End the backend session for the configured access token
    SignOut,
}

/// Service locations, credentials and timeouts.
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Evaluation service base URL
    #[arg(
        long,
        global = true,
        env = "COGNICLAUSE_API_URL",
        default_value = "http://127.0.0.1:8000"
    )]
    pub api_url: String,

    /// Timeout for evaluation and upload requests, in seconds
    #[arg(long, global = true, env = "COGNICLAUSE_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Timeout for the identity lookup before each request, in milliseconds
    #[arg(long, global = true, default_value_t = 2000)]
    pub identity_timeout_ms: u64,

    /// Auth+data backend base URL
    #[arg(long, global = true, env = "SUPABASE_URL")]
    pub backend_url: Option<String>,

    /// Auth+data backend public API key
    #[arg(long, global = true, env = "SUPABASE_KEY", hide_env_values = true)]
    pub backend_key: Option<String>,

    /// Session token of the signed-in user
    #[arg(
        long,
        global = true,
        env = "COGNICLAUSE_ACCESS_TOKEN",
        hide_env_values = true
    )]
    pub access_token: Option<String>,

    /// Attach this user id instead of asking the backend
    #[arg(long, global = true, env = "COGNICLAUSE_USER_ID")]
    pub user_id: Option<String>,
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            request_timeout: self.request_timeout(),
            identity_timeout: Duration::from_millis(self.identity_timeout_ms),
        }
    }

    /// Backend URL and key, when both are configured.
    pub fn backend(&self) -> Option<(&str, &str)> {
        match (self.backend_url.as_deref(), self.backend_key.as_deref()) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Some((url, key)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use cogniclause_core::RiskLevel;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn history_flags_parse() {
        let cli = Cli::try_parse_from([
            "cogniclause",
            "history",
            "--search",
            "nda",
            "--level",
            "high",
            "--page",
            "2",
        ])
        .unwrap();
        match cli.command {
            Command::History {
                search,
                level,
                page,
                page_size,
            } => {
                assert_eq!(search, "nda");
                assert_eq!(level, LevelFilter::Level(RiskLevel::High));
                assert_eq!(page, 2);
                assert_eq!(page_size, DEFAULT_PAGE_SIZE);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn session_config_from_flags() {
        let cli = Cli::try_parse_from([
            "cogniclause",
            "--timeout-secs",
            "5",
            "--identity-timeout-ms",
            "250",
            "health",
        ])
        .unwrap();
        let cfg = cli.config.session_config();
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
        assert_eq!(cfg.identity_timeout, Duration::from_millis(250));
    }

    #[test]
    fn backend_requires_url_and_key() {
        let cli = Cli::try_parse_from([
            "cogniclause",
            "--backend-url",
            "https://project.example.co",
            "health",
        ])
        .unwrap();
        let mut cfg = cli.config;
        cfg.backend_key = None;
        assert!(cfg.backend().is_none());
        cfg.backend_key = Some("anon".into());
        assert_eq!(cfg.backend(), Some(("https://project.example.co", "anon")));
    }
}
