use anyhow::{Context, Result};
use clap::{Arg, Command};

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Frontend base URL; pins CORS and decides Secure cookies")
                .env("BETLINK_FRONTEND_BASE_URL")
                .default_value("https://betlink.com"),
        )
        .arg(
            Arg::new("session-ttl-seconds")
                .long("session-ttl-seconds")
                .help("Access session TTL in seconds")
                .env("BETLINK_SESSION_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("refresh-ttl-seconds")
                .long("refresh-ttl-seconds")
                .help("Refresh cookie TTL in seconds")
                .env("BETLINK_REFRESH_TTL_SECONDS")
                .default_value("2592000")
                .value_parser(clap::value_parser!(i64)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub frontend_base_url: String,
    pub session_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
}

impl Options {
    /// Extract auth options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is somehow absent.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        Ok(Self {
            frontend_base_url: matches
                .get_one::<String>("frontend-base-url")
                .cloned()
                .context("missing required argument: --frontend-base-url")?,
            session_ttl_seconds: matches
                .get_one::<i64>("session-ttl-seconds")
                .copied()
                .context("missing required argument: --session-ttl-seconds")?,
            refresh_ttl_seconds: matches
                .get_one::<i64>("refresh-ttl-seconds")
                .copied()
                .context("missing required argument: --refresh-ttl-seconds")?,
        })
    }
}
