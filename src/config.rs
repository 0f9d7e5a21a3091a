//! Run configuration from CLI flags, the process environment and an env file.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;

use crate::discovery::{Endpoint, SourceGroup, SourceKind};
use crate::kuma::{Credentials, HttpCheck};
use crate::reconcile::{self, IgnorePatterns, TagPolicy};

mod env;
mod error;

pub use env::{EnvSource, parse_env_file};
pub use error::{Error, Result};

const DEFAULT_THROTTLE_MS: u64 = 200;
const DEFAULT_REAUTH_BACKOFF_MS: u64 = 1000;
const DEFAULT_KUMA_TIMEOUT_SECS: u64 = 30;

/// Sync Traefik routes and Docker containers with Uptime Kuma monitors.
#[derive(Debug, Default, clap::Parser)]
#[command(name = "kuma-sync", version)]
pub struct Args {
    /// Uptime Kuma URL (e.g. https://uptime.example.com)
    #[arg(long)]
    pub uptime_url: Option<String>,
    /// Uptime Kuma username
    #[arg(long)]
    pub username: Option<String>,
    /// Uptime Kuma password
    #[arg(long)]
    pub password: Option<String>,
    /// Path to the env file
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,
    /// Replace the tags of existing monitors with the group and source tags
    #[arg(long)]
    pub reset_tags: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub uptime_url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
    pub groups: Vec<SourceGroup>,
    pub ignore: IgnorePatterns,
    pub tag_policy: TagPolicy,
    pub throttle: Duration,
    pub reauth_backoff: Duration,
    pub ack_timeout: Duration,
    pub http_check: HttpCheck,
}

impl Config {
    /// Loads the env file named in `args`, then builds the configuration.
    pub fn load(args: &Args) -> Result<Self> {
        let env = EnvSource::load(&args.env_file)?;
        Self::from_sources(args, &env)
    }

    /// Builds the configuration; CLI flags win over `env`.
    ///
    /// # Errors
    ///
    /// Fails on a missing Uptime Kuma URL, when no source is configured, and
    /// on any value that does not parse.
    pub fn from_sources(args: &Args, env: &EnvSource) -> Result<Self> {
        let (url_key, raw_url) = match args.uptime_url.as_deref() {
            Some(raw) => ("--uptime-url", raw),
            None => (
                "UPTIME_KUMA_URL",
                env.get("UPTIME_KUMA_URL").ok_or(Error::MissingUptimeUrl)?,
            ),
        };
        let uptime_url = Url::parse(raw_url).map_err(|err| Error::InvalidUrl {
            key: url_key.to_owned(),
            value: raw_url.to_owned(),
            reason: err.to_string(),
        })?;

        let mut groups = source_groups(env, SourceKind::Proxy)?;
        groups.extend(source_groups(env, SourceKind::Workload)?);
        if groups.is_empty() {
            return Err(Error::NoSources);
        }

        let ignore = IgnorePatterns::new(env.get("IGNORE_PATTERNS").unwrap_or_default().split(','))?;
        let reset = args.reset_tags || env.get("RESET_TAGS").is_some_and(is_truthy);

        let defaults = HttpCheck::default();
        let http_check = HttpCheck {
            interval: number(env, "HTTP_MONITOR_INTERVAL", defaults.interval)?,
            retry_interval: number(env, "HTTP_MONITOR_RETRY_INTERVAL", defaults.retry_interval)?,
            max_retries: number(env, "HTTP_MONITOR_MAX_RETRIES", defaults.max_retries)?,
            timeout: number(env, "HTTP_MONITOR_TIMEOUT", defaults.timeout)?,
            ..defaults
        };

        Ok(Self {
            uptime_url,
            username: args
                .username
                .clone()
                .or_else(|| env.get("UPTIME_KUMA_USERNAME").map(str::to_owned)),
            password: args
                .password
                .clone()
                .or_else(|| env.get("UPTIME_KUMA_PASSWORD").map(str::to_owned)),
            groups,
            ignore,
            tag_policy: if reset {
                TagPolicy::Reset
            } else {
                TagPolicy::Additive
            },
            throttle: Duration::from_millis(number(env, "SYNC_THROTTLE_MS", DEFAULT_THROTTLE_MS)?),
            reauth_backoff: Duration::from_millis(number(
                env,
                "REAUTH_BACKOFF_MS",
                DEFAULT_REAUTH_BACKOFF_MS,
            )?),
            ack_timeout: Duration::from_secs(number(
                env,
                "KUMA_TIMEOUT_SECS",
                DEFAULT_KUMA_TIMEOUT_SECS,
            )?),
            http_check,
        })
    }

    pub fn reconcile_options(&self) -> reconcile::Options {
        reconcile::Options {
            ignore: self.ignore.clone(),
            tag_policy: self.tag_policy,
            throttle: self.throttle,
            http_check: self.http_check.clone(),
        }
    }

    /// Credentials from the configuration, asking on the terminal for
    /// whatever is missing. The password is read without echo.
    pub fn credentials(&self) -> Result<Credentials> {
        let username = match &self.username {
            Some(username) => username.clone(),
            None => dialoguer::Input::<String>::new()
                .with_prompt("Uptime Kuma username")
                .interact_text()?,
        };
        let password = match &self.password {
            Some(password) => password.clone(),
            None => dialoguer::Password::new()
                .with_prompt("Uptime Kuma password")
                .interact()?,
        };
        Ok(Credentials { username, password })
    }

    pub fn log_summary(&self) {
        log::info!("Uptime Kuma: {}", self.uptime_url);
        for group in &self.groups {
            match &group.runtime_host {
                Some(host) => log::info!(
                    "{} source '{}' at {} (Docker host '{host}')",
                    group.kind,
                    group.label,
                    group.endpoint
                ),
                None => log::info!("{} source '{}' at {}", group.kind, group.label, group.endpoint),
            }
        }
        if !self.ignore.is_empty() {
            log::info!("Ignore patterns: {}", self.ignore.as_strs().join(", "));
        }
        if self.tag_policy == TagPolicy::Reset {
            log::info!("Tag reset enabled: existing tags will be replaced");
        }
    }
}

/// Reads `<PREFIX>_<n>_URL` for n = 1, 2, ... until the first gap.
fn source_groups(env: &EnvSource, kind: SourceKind) -> Result<Vec<SourceGroup>> {
    let prefix = match kind {
        SourceKind::Proxy => "TRAEFIK",
        SourceKind::Workload => "DOCKER",
    };

    let mut groups = Vec::new();
    for n in 1.. {
        let url_key = format!("{prefix}_{n}_URL");
        let Some(raw) = env.get(&url_key) else {
            break;
        };
        let endpoint =
            Endpoint::parse(raw).map_err(|source| Error::InvalidEndpoint { key: url_key, source })?;
        let label = env
            .get(&format!("{prefix}_{n}_GROUP"))
            .map(str::to_owned)
            .unwrap_or_else(|| format!("{kind} {n}"));
        groups.push(match kind {
            SourceKind::Proxy => SourceGroup::proxy(endpoint, label),
            SourceKind::Workload => SourceGroup::workload(
                endpoint,
                label,
                env.get(&format!("{prefix}_{n}_HOST")).map(str::to_owned),
            ),
        });
    }
    Ok(groups)
}

fn number<T: FromStr>(env: &EnvSource, key: &str, default: T) -> Result<T> {
    match env.get(key) {
        Some(value) => value.parse().map_err(|_| Error::InvalidNumber {
            key: key.to_owned(),
            value: value.to_owned(),
        }),
        None => Ok(default),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
