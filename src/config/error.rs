use std::path::PathBuf;

use crate::discovery;
use crate::reconcile::InvalidPattern;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Uptime Kuma URL is required (--uptime-url or UPTIME_KUMA_URL)")]
    MissingUptimeUrl,
    #[error(
        "no sources configured; set at least one TRAEFIK_1_URL=http://... or DOCKER_1_URL=tcp://..."
    )]
    NoSources,
    #[error("invalid URL `{value}` for {key}: {reason}")]
    InvalidUrl {
        key: String,
        value: String,
        reason: String,
    },
    #[error("invalid endpoint for {key}: {source}")]
    InvalidEndpoint {
        key: String,
        #[source]
        source: discovery::Error,
    },
    #[error("invalid value `{value}` for {key}: expected a non-negative integer")]
    InvalidNumber { key: String, value: String },
    #[error(transparent)]
    InvalidIgnorePattern(#[from] InvalidPattern),
    #[error("failed to read env file `{path}`: {source}")]
    ReadEnvFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed line {line} in env file `{path}`: `{content}`")]
    EnvFileSyntax {
        path: PathBuf,
        line: usize,
        content: String,
    },
    #[error("failed to read credentials: {0}")]
    Prompt(#[from] dialoguer::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
