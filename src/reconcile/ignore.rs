use glob::{MatchOptions, Pattern, PatternError};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

#[derive(Debug, thiserror::Error)]
#[error("invalid ignore pattern `{pattern}`: {source}")]
pub struct InvalidPattern {
    pub pattern: String,
    #[source]
    pub source: PatternError,
}

/// Shell-style globs selecting endpoints that must never be monitored.
#[derive(Debug, Clone, Default)]
pub struct IgnorePatterns {
    patterns: Vec<Pattern>,
}

impl IgnorePatterns {
    /// Compiles the given globs with shell `fnmatch` semantics: runs of `*`
    /// are a single wildcard and an unclosed `[` is a literal. Blank entries
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPattern`] for the first glob that does not compile.
    pub fn new<I, S>(raw: I) -> Result<Self, InvalidPattern>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = raw
            .into_iter()
            .map(|pattern| pattern.as_ref().trim().to_owned())
            .filter(|pattern| !pattern.is_empty())
            .map(|pattern| {
                Pattern::new(&normalise(&pattern))
                    .map_err(|source| InvalidPattern { pattern, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn as_strs(&self) -> Vec<&str> {
        self.patterns.iter().map(Pattern::as_str).collect()
    }

    /// Whether `identifier` or its host component matches any pattern.
    pub fn matches(&self, identifier: &str) -> bool {
        let host = host_component(identifier);
        self.patterns.iter().any(|pattern| {
            pattern.matches_with(host, MATCH_OPTIONS)
                || pattern.matches_with(identifier, MATCH_OPTIONS)
        })
    }
}

/// Rewrites an `fnmatch` glob into one `glob::Pattern` accepts with the same
/// meaning.
fn normalise(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push('*');
                while chars.get(i + 1) == Some(&'*') {
                    i += 1;
                }
            }
            '[' => {
                // A `]` right after `[` or `[!` belongs to the class.
                let mut start = i + 1;
                if chars.get(start) == Some(&'!') {
                    start += 1;
                }
                if chars.get(start) == Some(&']') {
                    start += 1;
                }
                match chars[start..].iter().position(|&c| c == ']') {
                    Some(offset) => {
                        let end = start + offset;
                        out.extend(&chars[i..=end]);
                        i = end;
                    }
                    None => out.push_str("[[]"),
                }
            }
            c => out.push(c),
        }
        i += 1;
    }
    out
}

/// The `host[:port]` part of an `http(s)://` identifier, or the identifier
/// itself for anything else.
pub fn host_component(identifier: &str) -> &str {
    let Some(rest) = identifier
        .strip_prefix("https://")
        .or_else(|| identifier.strip_prefix("http://"))
    else {
        return identifier;
    };
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    &rest[..end]
}
