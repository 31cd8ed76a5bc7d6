//! Bootstrap DDL: schema and entity tables from the resolved catalog.
//! Idempotent: `CREATE ... IF NOT EXISTS` throughout, so it runs on every start.

use crate::config::{Catalog, ColumnDef, TableDef};
use crate::error::AppError;
use crate::sql::ident::quoted;
use sqlx::PgPool;

fn column_sql(c: &ColumnDef, schema: &str) -> String {
    let mut def = format!("{} {}", quoted(&c.name), c.sql_type.trim());
    if c.primary_key {
        def.push_str(" PRIMARY KEY");
    } else {
        if !c.nullable {
            def.push_str(" NOT NULL");
        }
        if c.unique {
            def.push_str(" UNIQUE");
        }
    }
    if let Some(ref d) = c.default {
        def.push_str(" DEFAULT ");
        def.push_str(d.trim());
    }
    if let Some(ref fk) = c.references {
        def.push_str(&format!(
            " REFERENCES {}.{} ({})",
            quoted(schema),
            quoted(&fk.table),
            quoted(&fk.column)
        ));
        if fk.on_delete_cascade {
            def.push_str(" ON DELETE CASCADE");
        }
    }
    def
}

pub fn create_table_sql(schema: &str, table: &TableDef) -> String {
    let cols: Vec<String> = table.columns.iter().map(|c| column_sql(c, schema)).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {}.{} (\n  {}\n)",
        quoted(schema),
        quoted(&table.name),
        cols.join(",\n  ")
    )
}

/// `ALTER TABLE ... ADD COLUMN IF NOT EXISTS` for columns the builder depends on,
/// so tables created before they were added still work.
pub fn add_column_sql(schema: &str, table: &str, column: &ColumnDef) -> String {
    format!(
        "ALTER TABLE {}.{} ADD COLUMN IF NOT EXISTS {}",
        quoted(schema),
        quoted(table),
        column_sql(column, schema)
    )
}

/// Create the schema and every catalog table, in definition order.
pub async fn bootstrap_tables(
    pool: &PgPool,
    schema: &str,
    catalog: &Catalog,
    ensured_columns: &[&str],
) -> Result<(), AppError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
        .execute(pool)
        .await?;

    for entity in catalog.entities() {
        let sql = create_table_sql(schema, &entity.definition);
        tracing::debug!(sql = %sql, "ddl");
        sqlx::query(&sql).execute(pool).await?;

        for col in entity
            .definition
            .columns
            .iter()
            .filter(|c| ensured_columns.contains(&c.name.as_str()))
        {
            let alter = add_column_sql(schema, &entity.name, col);
            if let Err(e) = sqlx::query(&alter).execute(pool).await {
                tracing::warn!(table = %entity.name, column = %col.name, error = %e, "could not add column");
            }
        }
        tracing::info!(table = %entity.name, "table ready");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_tables, resolve};

    #[test]
    fn renders_contacts_table() {
        let catalog = resolve(&default_tables(), &["created_at", "updated_at"]).unwrap();
        let contacts = catalog.entity("contacts").unwrap();
        let sql = create_table_sql("public", &contacts.definition);
        assert!(sql.starts_with(r#"CREATE TABLE IF NOT EXISTS "public"."contacts" ("#));
        assert!(sql.contains(r#""id" SERIAL PRIMARY KEY"#));
        assert!(sql.contains(r#""email" VARCHAR(255) NOT NULL UNIQUE"#));
        assert!(sql.contains(r#""tags" TEXT[]"#));
        assert!(sql.contains(r#""created_at" TIMESTAMPTZ NOT NULL DEFAULT NOW()"#));
        assert!(sql.contains(r#""updated_at" TIMESTAMPTZ NOT NULL DEFAULT NOW()"#));
    }

    #[test]
    fn renders_foreign_keys() {
        let catalog = resolve(&default_tables(), &[]).unwrap();
        let automations = catalog.entity("automations").unwrap();
        let sql = create_table_sql("funnel", &automations.definition);
        assert!(sql.contains(
            r#""project_id" INTEGER REFERENCES "funnel"."funnel_projects" ("id") ON DELETE CASCADE"#
        ));
        assert!(sql.contains(r#""status" VARCHAR(50) DEFAULT 'inactive'"#));
    }

    #[test]
    fn add_column_is_idempotent_ddl() {
        let col = ColumnDef {
            nullable: false,
            default: Some("NOW()".into()),
            ..ColumnDef::new("updated_at", "TIMESTAMPTZ")
        };
        assert_eq!(
            add_column_sql("public", "segments", &col),
            r#"ALTER TABLE "public"."segments" ADD COLUMN IF NOT EXISTS "updated_at" TIMESTAMPTZ NOT NULL DEFAULT NOW()"#
        );
    }
}
