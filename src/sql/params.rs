//! Convert serde_json::Value to types that sqlx can bind.

use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};

/// A value that can be bound to a PostgreSQL query. Each variant declares its own
/// parameter type so the server sees int8/float8/bool/text/text[]/jsonb/uuid rather
/// than one blanket type. NULL is sent untyped and takes the type of its context.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Uuid(uuid::Uuid),
    TextArray(Vec<String>),
    Json(Value),
}

impl PgBindValue {
    /// Shape-only conversion, for columns with no known type.
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => PgBindValue::Null,
            Value::Bool(b) => PgBindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PgBindValue::I64(i)
                } else if let Some(f) = n.as_f64() {
                    PgBindValue::F64(f)
                } else {
                    PgBindValue::String(n.to_string())
                }
            }
            Value::String(s) => PgBindValue::String(s.clone()),
            Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_string) => {
                PgBindValue::TextArray(
                    items
                        .iter()
                        .filter_map(|i| i.as_str().map(String::from))
                        .collect(),
                )
            }
            Value::Array(_) | Value::Object(_) => PgBindValue::Json(v.clone()),
        }
    }

    /// Conversion guided by the column's placeholder cast (`jsonb`, `text[]`, `uuid`, ...).
    /// The bound type must have a server cast to `cast`; text[] and jsonb have none
    /// between them, so the cast wins over the value's shape.
    pub fn for_column(v: &Value, cast: Option<&str>) -> Self {
        let Some(cast) = cast else {
            return Self::from_json(v);
        };
        match v {
            Value::Null => PgBindValue::Null,
            _ if cast == "json" || cast == "jsonb" => PgBindValue::Json(v.clone()),
            Value::Array(items) if cast.ends_with("[]") => match array_elements_as_text(items) {
                Some(items) => PgBindValue::TextArray(items),
                None => PgBindValue::Json(v.clone()),
            },
            Value::String(s) if cast == "uuid" => match uuid::Uuid::parse_str(s) {
                Ok(u) => PgBindValue::Uuid(u),
                Err(_) => PgBindValue::String(s.clone()),
            },
            _ => Self::from_json(v),
        }
    }
}

/// Scalar array elements in their text form; `None` if any element is null or nested.
fn array_elements_as_text(items: &[Value]) -> Option<Vec<String>> {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .collect()
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgBindValue::Null => IsNull::Yes,
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::String(s) => <String as Encode<Postgres>>::encode_by_ref(s, buf)?,
            PgBindValue::Uuid(u) => <uuid::Uuid as Encode<Postgres>>::encode_by_ref(u, buf)?,
            PgBindValue::TextArray(items) => <Vec<String> as Encode<Postgres>>::encode_by_ref(items, buf)?,
            PgBindValue::Json(v) => <Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
        })
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            // OID 0 leaves the parameter type unspecified for the server to infer.
            PgBindValue::Null => PgTypeInfo::with_oid(Oid(0)),
            PgBindValue::String(_) => <String as Type<Postgres>>::type_info(),
            PgBindValue::Bool(_) => <bool as Type<Postgres>>::type_info(),
            PgBindValue::I64(_) => <i64 as Type<Postgres>>::type_info(),
            PgBindValue::F64(_) => <f64 as Type<Postgres>>::type_info(),
            PgBindValue::Uuid(_) => <uuid::Uuid as Type<Postgres>>::type_info(),
            PgBindValue::TextArray(_) => <Vec<String> as Type<Postgres>>::type_info(),
            PgBindValue::Json(_) => <Value as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_keep_their_shape() {
        assert_eq!(PgBindValue::from_json(&json!(null)), PgBindValue::Null);
        assert_eq!(PgBindValue::from_json(&json!(true)), PgBindValue::Bool(true));
        assert_eq!(PgBindValue::from_json(&json!(42)), PgBindValue::I64(42));
        assert_eq!(PgBindValue::from_json(&json!(1.5)), PgBindValue::F64(1.5));
        assert_eq!(
            PgBindValue::from_json(&json!("a@x.com")),
            PgBindValue::String("a@x.com".into())
        );
    }

    #[test]
    fn uuids_bind_as_uuid_only_for_uuid_columns() {
        let id = "6f1f5d0e-8d4c-4a57-9a43-2f0d1a6f3c11";
        assert_eq!(PgBindValue::from_json(&json!(id)), PgBindValue::String(id.into()));
        assert_eq!(
            PgBindValue::for_column(&json!(id), Some("varchar")),
            PgBindValue::String(id.into())
        );
        assert!(matches!(
            PgBindValue::for_column(&json!(id), Some("uuid")),
            PgBindValue::Uuid(_)
        ));
        assert_eq!(
            PgBindValue::for_column(&json!("not-a-uuid"), Some("uuid")),
            PgBindValue::String("not-a-uuid".into())
        );
    }

    #[test]
    fn string_arrays_bind_as_text_array() {
        assert_eq!(
            PgBindValue::from_json(&json!(["lead", "vip"])),
            PgBindValue::TextArray(vec!["lead".into(), "vip".into()])
        );
    }

    #[test]
    fn mixed_arrays_and_objects_bind_as_json() {
        let steps = json!([{ "type": "email" }, 3]);
        assert_eq!(PgBindValue::from_json(&steps), PgBindValue::Json(steps.clone()));
        let design = json!({ "blocks": [] });
        assert_eq!(PgBindValue::from_json(&design), PgBindValue::Json(design.clone()));
        assert_eq!(PgBindValue::from_json(&json!([])), PgBindValue::Json(json!([])));
    }

    #[test]
    fn json_columns_take_any_shape_as_json() {
        let rules = json!(["vip", "lead"]);
        assert_eq!(
            PgBindValue::for_column(&rules, Some("jsonb")),
            PgBindValue::Json(rules.clone())
        );
        assert_eq!(
            PgBindValue::for_column(&json!("plain"), Some("json")),
            PgBindValue::Json(json!("plain"))
        );
        assert_eq!(PgBindValue::for_column(&json!(null), Some("jsonb")), PgBindValue::Null);
    }

    #[test]
    fn array_columns_take_arrays_as_text_array() {
        assert_eq!(
            PgBindValue::for_column(&json!([]), Some("text[]")),
            PgBindValue::TextArray(vec![])
        );
        assert_eq!(
            PgBindValue::for_column(&json!([1, 2]), Some("integer[]")),
            PgBindValue::TextArray(vec!["1".into(), "2".into()])
        );
        assert_eq!(
            PgBindValue::for_column(&json!([[1], 2]), Some("integer[]")),
            PgBindValue::Json(json!([[1], 2]))
        );
    }

    #[test]
    fn scalar_columns_fall_back_to_shape() {
        assert_eq!(PgBindValue::for_column(&json!(7), Some("integer")), PgBindValue::I64(7));
        assert_eq!(PgBindValue::for_column(&json!(7), None), PgBindValue::I64(7));
    }

    #[test]
    fn null_is_sent_untyped() {
        let oid = PgBindValue::Null.produces().and_then(|t| t.oid());
        assert_eq!(oid, Some(Oid(0)));
        let text = PgBindValue::String("x".into()).produces().and_then(|t| t.oid());
        assert_eq!(text, <String as Type<Postgres>>::type_info().oid());
    }
}
