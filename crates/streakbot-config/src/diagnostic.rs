// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment and validation failures into miette diagnostics.
//!
//! Unknown keys get a "did you mean?" hint based on Jaro-Winkler similarity
//! and, when the offending file can be located, a labelled source span.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Similarity a known key needs before it is offered as a correction.
/// Catches `daly_cap` -> `daily_cap` and `cutof_hour` -> `cutoff_hour`.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with enough context for miette to render it.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(streakbot::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        /// Comma-separated keys accepted by the section.
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(streakbot::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(streakbot::config::missing_key),
        help("add `{key} = <value>` to streakbot.toml or set it via STREAKBOT_* env vars")
    )]
    MissingKey { key: String },

    /// A cron expression in `[schedule]` does not parse.
    #[error("schedule.{key} `{expression}` is not a valid cron expression: {reason}")]
    #[diagnostic(
        code(streakbot::config::invalid_schedule),
        help("use five fields: minute hour day-of-month month day-of-week, e.g. \"0 10 * * *\"")
    )]
    InvalidSchedule {
        key: String,
        expression: String,
        reason: String,
    },

    #[error("validation error: {message}")]
    #[diagnostic(code(streakbot::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(streakbot::config::other))]
    Other(String),
}

impl ConfigError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Converts every error carried by a `figment::Error` into a `ConfigError`.
///
/// `toml_sources` holds `(path, content)` pairs used to locate unknown keys.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let valid: Vec<&str> = expected.to_vec();
                let (span, src) = locate_key(&error, field, toml_sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, &valid),
                    valid_keys: valid.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.clone().into_owned(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: error
                    .path
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

fn locate_key(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some(path) = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        })
    else {
        return (None, None);
    };

    let Some((name, content)) = toml_sources.iter().find(|(p, _)| *p == path) else {
        return (None, None);
    };

    match find_key_offset(content, &error.path, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(name, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` in TOML `content`, searched after the header of
/// `path[0]` when a section is given.
///
/// Array-of-table sections (`[[quests.catalog]]`) match on their first header.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = match path.first() {
        None => 0,
        Some(section) => {
            let dotted = path.join(".");
            [format!("[{dotted}]"), format!("[[{dotted}]]"), format!("[{section}]")]
                .iter()
                .find_map(|header| content.find(header.as_str()).map(|pos| pos + header.len()))?
        }
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix(field)
            && (rest.starts_with(&[' ', '\t', '='][..]))
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// The closest valid key above the similarity threshold, if any.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|&key| (key, strsim::jaro_winkler(unknown, key)))
        .filter(|(_, score)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key.to_string())
}

/// Render errors to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        if handler.render_report(&mut buf, error as &dyn Diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_daily_cap_for_typo() {
        assert_eq!(
            suggest_key("daly_cap", &["daily_cap"]),
            Some("daily_cap".to_string())
        );
    }

    #[test]
    fn suggests_closest_of_several() {
        let valid = &["per_day", "exclude_recent_days", "cutoff_hour", "match_bare_words"];
        assert_eq!(suggest_key("cutof_hour", valid), Some("cutoff_hour".to_string()));
    }

    #[test]
    fn no_suggestion_for_noise() {
        assert_eq!(suggest_key("zzzzzz", &["workers", "max_attempts"]), None);
    }

    #[test]
    fn finds_key_inside_section() {
        let content = "[bot]\nname = \"x\"\n\n[quests]\nper_dya = 2\n";
        let path = vec!["quests".to_string()];
        let o = find_key_offset(content, &path, "per_dya").unwrap();
        assert_eq!(&content[o..o + 7], "per_dya");
    }

    #[test]
    fn finds_key_in_array_of_tables() {
        let content = "[[quests.catalog]]\ndescription = \"Run\"\ntagg = \"run\"\n";
        let path = vec!["quests".to_string(), "catalog".to_string()];
        let o = find_key_offset(content, &path, "tagg").unwrap();
        assert_eq!(&content[o..o + 4], "tagg");
    }

    #[test]
    fn prefix_of_longer_key_is_not_matched() {
        let content = "[quests]\nper_day_x = 1\n";
        let path = vec!["quests".to_string()];
        assert_eq!(find_key_offset(content, &path, "per_day"), None);
    }
}
