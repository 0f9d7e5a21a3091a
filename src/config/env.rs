use std::collections::HashMap;
use std::path::Path;

use super::error::{Error, Result};

/// Configuration variables from an env file overlaid by the process
/// environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: HashMap<String, String>,
}

impl EnvSource {
    /// Reads `env_file` if it exists, then applies the process environment on
    /// top of it.
    pub fn load(env_file: &Path) -> Result<Self> {
        let mut vars = if env_file.is_file() {
            log::info!("Loading configuration from {}", env_file.display());
            let content = std::fs::read_to_string(env_file).map_err(|source| Error::ReadEnvFile {
                path: env_file.to_path_buf(),
                source,
            })?;
            parse_env_file(&content, env_file)?
        } else {
            log::debug!("No env file at {}", env_file.display());
            HashMap::new()
        };
        vars.extend(std::env::vars());
        Ok(Self { vars })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// The trimmed value of `key`; empty values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Parses `KEY=VALUE` lines. Blank lines and `#` comments are skipped, an
/// `export ` prefix is accepted and matching outer quotes are removed.
pub fn parse_env_file(content: &str, path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            return Err(Error::EnvFileSyntax {
                path: path.to_path_buf(),
                line: index + 1,
                content: line.to_owned(),
            });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::EnvFileSyntax {
                path: path.to_path_buf(),
                line: index + 1,
                content: line.to_owned(),
            });
        }
        vars.insert(key.to_owned(), unquote(value.trim()).to_owned());
    }
    Ok(vars)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
