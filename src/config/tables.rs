//! Table definitions used for bootstrap DDL and the runtime catalog.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    /// SQL type as written in DDL, e.g. `VARCHAR(255)`, `TEXT[]`, `SERIAL`.
    #[serde(rename = "type")]
    pub sql_type: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub unique: bool,
    /// Default expression, e.g. `'inactive'` or `NOW()`.
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub references: Option<ForeignKeyDef>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ForeignKeyDef {
    pub table: String,
    #[serde(default = "default_id_column")]
    pub column: String,
    #[serde(default)]
    pub on_delete_cascade: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

fn default_true() -> bool {
    true
}

fn default_id_column() -> String {
    "id".into()
}

impl ColumnDef {
    pub fn new(name: &str, sql_type: &str) -> Self {
        ColumnDef {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: true,
            primary_key: false,
            unique: false,
            default: None,
            references: None,
        }
    }

    fn serial_pk() -> Self {
        ColumnDef {
            primary_key: true,
            nullable: false,
            ..ColumnDef::new("id", "SERIAL")
        }
    }

    fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    fn default(mut self, expr: &str) -> Self {
        self.default = Some(expr.into());
        self
    }

    fn references(mut self, table: &str, on_delete_cascade: bool) -> Self {
        self.references = Some(ForeignKeyDef {
            table: table.into(),
            column: default_id_column(),
            on_delete_cascade,
        });
        self
    }

    /// Type used to cast a bound placeholder for this column (`$n::<type>`).
    /// Serial types become their integer type; length modifiers are dropped so a
    /// cast never truncates.
    pub fn cast_type(&self) -> String {
        let lower = self.sql_type.trim().to_lowercase();
        let is_array = lower.ends_with("[]");
        let base = lower.trim_end_matches("[]");
        let base = base.split('(').next().unwrap_or(base).trim();
        let base = match base {
            "serial" | "serial4" => "integer",
            "bigserial" | "serial8" => "bigint",
            "smallserial" | "serial2" => "smallint",
            other => other,
        };
        if is_array {
            format!("{}[]", base)
        } else {
            base.to_string()
        }
    }
}

fn page_table(name: &str) -> TableDef {
    TableDef {
        name: name.into(),
        columns: vec![
            ColumnDef::serial_pk(),
            ColumnDef::new("name", "VARCHAR(255)").not_null(),
            ColumnDef::new("slug", "VARCHAR(255)").not_null().unique(),
            ColumnDef::new("project_id", "INTEGER").references("funnel_projects", false),
            ColumnDef::new("design_json", "JSONB"),
            ColumnDef::new("created_by", "VARCHAR(255)"),
        ],
    }
}

/// Tables created at startup when no `TABLES_PATH` is configured.
pub fn default_tables() -> Vec<TableDef> {
    vec![
        TableDef {
            name: "funnel_projects".into(),
            columns: vec![
                ColumnDef::serial_pk(),
                ColumnDef::new("name", "VARCHAR(255)").not_null(),
                ColumnDef::new("description", "TEXT"),
                ColumnDef::new("created_by", "VARCHAR(255)"),
            ],
        },
        TableDef {
            name: "automations".into(),
            columns: vec![
                ColumnDef::serial_pk(),
                ColumnDef::new("name", "VARCHAR(255)").not_null(),
                ColumnDef::new("project_id", "INTEGER").references("funnel_projects", true),
                ColumnDef::new("landing_page_id", "INTEGER"),
                ColumnDef::new("thank_you_page_id", "INTEGER"),
                ColumnDef::new("trigger_tag", "VARCHAR(255)"),
                ColumnDef::new("company_id", "VARCHAR(255)"),
                ColumnDef::new("status", "VARCHAR(50)").default("'inactive'"),
                ColumnDef::new("steps", "JSONB"),
            ],
        },
        TableDef {
            name: "contacts".into(),
            columns: vec![
                ColumnDef::serial_pk(),
                ColumnDef::new("email", "VARCHAR(255)").not_null().unique(),
                ColumnDef::new("first_name", "VARCHAR(255)"),
                ColumnDef::new("phone", "VARCHAR(50)"),
                ColumnDef::new("tags", "TEXT[]"),
                ColumnDef::new("source", "VARCHAR(255)"),
                ColumnDef::new("country_code", "VARCHAR(10)"),
                ColumnDef::new("city_area_code", "VARCHAR(10)"),
            ],
        },
        page_table("landing_pages"),
        page_table("thank_you_pages"),
        page_table("sales_pages"),
        TableDef {
            name: "segments".into(),
            columns: vec![
                ColumnDef::serial_pk(),
                ColumnDef::new("name", "VARCHAR(255)").not_null(),
                ColumnDef::new("rules", "JSONB"),
            ],
        },
        TableDef {
            name: "page_visits".into(),
            columns: vec![
                ColumnDef::serial_pk(),
                ColumnDef::new("contact_id", "INTEGER"),
                ColumnDef::new("page_slug", "VARCHAR(255)"),
                ColumnDef::new("duration_seconds", "INTEGER"),
                ColumnDef::new("created_by", "VARCHAR(255)"),
            ],
        },
        TableDef {
            name: "telemetry".into(),
            columns: vec![
                ColumnDef::serial_pk(),
                ColumnDef::new("event_type", "VARCHAR(100)").not_null(),
                ColumnDef::new("contact_id", "INTEGER"),
                ColumnDef::new("page_slug", "VARCHAR(255)"),
                ColumnDef::new("payload", "JSONB"),
            ],
        },
        TableDef {
            name: "video_watch".into(),
            columns: vec![
                ColumnDef::serial_pk(),
                ColumnDef::new("contact_id", "INTEGER"),
                ColumnDef::new("video_id", "VARCHAR(255)"),
                ColumnDef::new("seconds_watched", "INTEGER"),
                ColumnDef::new("completed", "BOOLEAN").default("FALSE"),
            ],
        },
    ]
}
