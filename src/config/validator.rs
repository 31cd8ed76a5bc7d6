//! Table definition validation: identifiers, DDL fragments and references.

use crate::config::TableDef;
use crate::error::ConfigError;
use crate::sql::is_identifier;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn type_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_ ]*(\(\s*\d+\s*(,\s*\d+\s*)?\))?(\[\])?$").expect("static type pattern")
    })
}

fn default_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^('[A-Za-z0-9_ .:-]*'|-?\d+(\.\d+)?|TRUE|FALSE|true|false|NULL|[A-Za-z_]+\(\))$")
            .expect("static default pattern")
    })
}

fn check_ident(context: &'static str, name: &str) -> Result<(), ConfigError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            context,
            name: name.to_string(),
        })
    }
}

/// Validate table definitions in order. A foreign key may only reference a table
/// defined earlier in the list, so the list is also a valid creation order.
pub fn validate(tables: &[TableDef]) -> Result<(), ConfigError> {
    let mut seen_tables: HashSet<&str> = HashSet::new();

    for t in tables {
        check_ident("table", &t.name)?;
        if t.columns.is_empty() {
            return Err(ConfigError::Validation(format!("table {} has no columns", t.name)));
        }

        let mut seen_columns: HashSet<&str> = HashSet::new();
        let mut pk_count = 0;
        for c in &t.columns {
            check_ident("column", &c.name)?;
            if !seen_columns.insert(c.name.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "column",
                    name: format!("{}.{}", t.name, c.name),
                });
            }
            if !type_pattern().is_match(c.sql_type.trim()) {
                return Err(ConfigError::Invalid {
                    key: "column type",
                    value: format!("{}.{}: {}", t.name, c.name, c.sql_type),
                });
            }
            if let Some(ref d) = c.default {
                if !default_pattern().is_match(d.trim()) {
                    return Err(ConfigError::Invalid {
                        key: "column default",
                        value: format!("{}.{}: {}", t.name, c.name, d),
                    });
                }
            }
            if c.primary_key {
                pk_count += 1;
            }
            if let Some(ref fk) = c.references {
                check_ident("reference", &fk.table)?;
                check_ident("reference", &fk.column)?;
                let self_ref = fk.table == t.name;
                if !self_ref && !seen_tables.contains(fk.table.as_str()) {
                    return Err(ConfigError::MissingReference {
                        table: fk.table.clone(),
                        from: format!("{}.{}", t.name, c.name),
                    });
                }
            }
        }
        if pk_count != 1 {
            return Err(ConfigError::Validation(format!(
                "table {} must have exactly one primary key column, found {}",
                t.name, pk_count
            )));
        }
        if !seen_tables.insert(t.name.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "table",
                name: t.name.clone(),
            });
        }
    }
    Ok(())
}
