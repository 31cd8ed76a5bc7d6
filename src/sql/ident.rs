//! Identifier allow-pattern. Anything interpolated into SQL text as an identifier
//! (schema, table, column) must pass `^[A-Za-z0-9_]+$` first.

use crate::error::AppError;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn allow_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("static identifier pattern"))
}

pub fn is_identifier(s: &str) -> bool {
    allow_pattern().is_match(s)
}

/// Quote identifier for PostgreSQL. Input has already passed `is_identifier`.
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Validated entity (table) name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityName(String);

impl EntityName {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        if is_identifier(raw) {
            Ok(EntityName(raw.to_string()))
        } else {
            Err(AppError::InvalidEntity(raw.to_string()))
        }
    }

    /// URL path segments use hyphens where table names use underscores.
    pub fn from_path_segment(segment: &str) -> Result<Self, AppError> {
        Self::parse(&segment.replace('-', "_"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check a FieldMap key before it is used as a column identifier.
pub fn check_field(name: &str) -> Result<&str, AppError> {
    if is_identifier(name) {
        Ok(name)
    } else {
        Err(AppError::InvalidField(name.to_string()))
    }
}
