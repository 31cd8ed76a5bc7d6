// Round trips against a live PostgreSQL. Run with:
//   DATABASE_URL=postgres://... cargo test --test store -- --ignored
// Each test bootstraps the default tables into its own schema and drops it afterwards.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::DateTime;
use funnel_api::config::{ColumnDef, TableDef};
use funnel_api::{
    app, bootstrap_tables, build_state, connect_pool, load_catalog, resolve, AppError, AppState,
    EntityName, FieldMap, Settings,
};
use serde_json::{json, Value};
use tower::ServiceExt;

struct Harness {
    state: AppState,
    schema: String,
}

impl Harness {
    async fn new() -> Self {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let schema = format!("funnel_test_{}", uuid::Uuid::new_v4().simple());
        let settings = Settings {
            database_url,
            db_schema: schema.clone(),
            ..Settings::default()
        };
        let pool = connect_pool(&settings).await.unwrap();
        let catalog = load_catalog(&settings).await.unwrap();
        bootstrap_tables(
            &pool,
            &schema,
            &catalog,
            &[settings.created_at_column.as_str(), settings.updated_at_column.as_str()],
        )
        .await
        .unwrap();
        Harness {
            state: build_state(settings, catalog, pool),
            schema,
        }
    }

    /// Run raw DDL in this harness's schema.
    async fn execute(&self, sql: &str) {
        sqlx::query(sql).execute(self.state.crud.pool()).await.unwrap();
    }

    /// Same pool and schema, with `extra` tables registered in the catalog.
    fn with_tables(&self, extra: Vec<TableDef>) -> AppState {
        let mut tables = funnel_api::config::default_tables();
        tables.extend(extra);
        let settings = (*self.state.settings).clone();
        let catalog = resolve(
            &tables,
            &[settings.created_at_column.as_str(), settings.updated_at_column.as_str()],
        )
        .unwrap();
        build_state(settings, catalog, self.state.crud.pool().clone())
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if body.is_some() {
            req = req.header(header::CONTENT_TYPE, "application/json");
        }
        let req = req
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let resp = app(self.state.clone()).oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn teardown(self) {
        sqlx::query(&format!("DROP SCHEMA \"{}\" CASCADE", self.schema))
            .execute(self.state.crud.pool())
            .await
            .unwrap();
    }
}

fn fields(v: Value) -> FieldMap {
    match v {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn contacts() -> EntityName {
    EntityName::from_path_segment("contacts").unwrap()
}

#[tokio::test]
#[ignore]
async fn create_then_filter() {
    let h = Harness::new().await;
    let crud = &h.state.crud;

    let row = crud
        .create(
            &contacts(),
            &fields(json!({ "email": "a@x.com", "first_name": "Ann", "tags": ["vip", "beta"] })),
        )
        .await
        .unwrap();
    assert_eq!(row["email"], "a@x.com");
    assert_eq!(row["tags"], json!(["vip", "beta"]));
    assert!(row["id"].is_i64());
    assert!(row["created_at"].is_string());

    let found = crud
        .filter(&contacts(), &fields(json!({ "email": "a@x.com" })))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["first_name"], "Ann");

    h.teardown().await;
}

#[tokio::test]
#[ignore]
async fn update_changes_fields_and_timestamp() {
    let h = Harness::new().await;
    let crud = &h.state.crud;

    let row = crud
        .create(&contacts(), &fields(json!({ "email": "b@x.com", "first_name": "Bo" })))
        .await
        .unwrap();
    let id = row["id"].clone();

    let updated = crud
        .update(&contacts(), &id, &fields(json!({ "first_name": "Bob", "id": 999 })))
        .await
        .unwrap();
    assert_eq!(updated["id"], id);
    assert_eq!(updated["first_name"], "Bob");

    let created_at = DateTime::parse_from_rfc3339(updated["created_at"].as_str().unwrap()).unwrap();
    let updated_at = DateTime::parse_from_rfc3339(updated["updated_at"].as_str().unwrap()).unwrap();
    assert!(updated_at >= created_at);

    let listed = crud.list(&contacts(), None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["first_name"], "Bob");

    h.teardown().await;
}

#[tokio::test]
#[ignore]
async fn update_of_missing_id_is_not_found() {
    let h = Harness::new().await;
    let err = h
        .state
        .crud
        .update(&contacts(), &json!(424242), &fields(json!({ "first_name": "X" })))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    h.teardown().await;
}

#[tokio::test]
#[ignore]
async fn remove_is_idempotent() {
    let h = Harness::new().await;
    let crud = &h.state.crud;

    let row = crud
        .create(&contacts(), &fields(json!({ "email": "c@x.com" })))
        .await
        .unwrap();
    let id = row["id"].clone();

    assert_eq!(crud.remove(&contacts(), &id).await.unwrap(), 1);
    assert_eq!(crud.remove(&contacts(), &id).await.unwrap(), 0);
    let found = crud
        .filter(&contacts(), &fields(json!({ "email": "c@x.com" })))
        .await
        .unwrap();
    assert!(found.is_empty());

    h.teardown().await;
}

#[tokio::test]
#[ignore]
async fn list_is_newest_first_and_limited() {
    let h = Harness::new().await;
    let crud = &h.state.crud;

    for n in 0..3 {
        crud.create(&contacts(), &fields(json!({ "email": format!("{n}@x.com") })))
            .await
            .unwrap();
    }

    let all = crud.list(&contacts(), None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0]["email"], "2@x.com");

    let limited = crud.list(&contacts(), Some(2)).await.unwrap();
    assert_eq!(limited.len(), 2);

    let unfiltered = crud.filter(&contacts(), &FieldMap::new()).await.unwrap();
    assert_eq!(unfiltered.len(), all.len());

    h.teardown().await;
}

#[tokio::test]
#[ignore]
async fn json_payloads_round_trip() {
    let h = Harness::new().await;
    let crud = &h.state.crud;
    let telemetry = EntityName::from_path_segment("telemetry").unwrap();

    let row = crud
        .create(
            &telemetry,
            &fields(json!({ "event_type": "page_view", "payload": { "path": "/a", "ms": 12 } })),
        )
        .await
        .unwrap();
    assert_eq!(row["payload"]["ms"], 12);

    // Filters are plain equality, so a null value matches nothing.
    let nulls = crud
        .filter(&telemetry, &fields(json!({ "contact_id": null })))
        .await
        .unwrap();
    assert!(nulls.is_empty());

    let views = crud
        .filter(&telemetry, &fields(json!({ "event_type": "page_view" })))
        .await
        .unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0]["payload"], json!({ "path": "/a", "ms": 12 }));

    h.teardown().await;
}

#[tokio::test]
#[ignore]
async fn telemetry_overview_counts_events() {
    let h = Harness::new().await;
    let crud = &h.state.crud;
    let telemetry = EntityName::from_path_segment("telemetry").unwrap();

    for event in ["page_view", "page_view", "click"] {
        crud.create(&telemetry, &fields(json!({ "event_type": event })))
            .await
            .unwrap();
    }

    let overview = funnel_api::service::telemetry_overview(crud.pool(), &h.schema, "created_at")
        .await
        .unwrap();
    assert_eq!(overview.total_events, 3);
    assert_eq!(overview.last_24h.iter().map(|e| e.total).sum::<i64>(), 3);
    assert_eq!(overview.by_event[0].event_type.as_deref(), Some("page_view"));
    assert_eq!(overview.by_event[0].total, 2);

    h.teardown().await;
}

#[tokio::test]
#[ignore]
async fn unknown_column_surfaces_driver_error() {
    let h = Harness::new().await;
    let err = h
        .state
        .crud
        .filter(&contacts(), &fields(json!({ "nickname": "x" })))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Query(_)));
    assert!(err.to_string().contains("nickname"));
    h.teardown().await;
}

#[tokio::test]
#[ignore]
async fn json_columns_accept_string_arrays() {
    let h = Harness::new().await;
    let segments = EntityName::from_path_segment("segments").unwrap();
    let row = h
        .state
        .crud
        .create(&segments, &fields(json!({ "name": "s", "rules": ["vip", "lead"] })))
        .await
        .unwrap();
    assert_eq!(row["rules"], json!(["vip", "lead"]));

    let found = h
        .state
        .crud
        .filter(&segments, &fields(json!({ "rules": ["vip", "lead"] })))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    h.teardown().await;
}

#[tokio::test]
#[ignore]
async fn array_columns_accept_empty_arrays() {
    let h = Harness::new().await;
    let row = h
        .state
        .crud
        .create(&contacts(), &fields(json!({ "email": "e@x.com", "tags": [] })))
        .await
        .unwrap();
    assert_eq!(row["tags"], json!([]));
    h.teardown().await;
}

#[tokio::test]
#[ignore]
async fn same_statement_with_differently_typed_values() {
    let h = Harness::new().await;
    let crud = &h.state.crud;
    crud.create(&contacts(), &fields(json!({ "email": "f@x.com", "phone": "12345" })))
        .await
        .unwrap();

    let by_number = crud
        .filter(&contacts(), &fields(json!({ "phone": 12345 })))
        .await
        .unwrap();
    let by_text = crud
        .filter(&contacts(), &fields(json!({ "phone": "12345" })))
        .await
        .unwrap();
    assert_eq!(by_number.len(), 1);
    assert_eq!(by_text.len(), 1);
    h.teardown().await;
}

#[tokio::test]
#[ignore]
async fn numeric_columns_round_trip() {
    let h = Harness::new().await;
    h.execute(&format!(
        "CREATE TABLE \"{}\".\"prices\" (id SERIAL PRIMARY KEY, amount NUMERIC(10, 2), \
         created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(), updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW())",
        h.schema
    ))
    .await;
    let prices = EntityName::from_path_segment("prices").unwrap();

    // Unregistered table: numbers bind by shape, NUMERIC decodes to its exact text.
    let row = h
        .state
        .crud
        .create(&prices, &fields(json!({ "amount": 12.5 })))
        .await
        .unwrap();
    assert_eq!(row["amount"], "12.50");

    // Registered table: string input is cast to numeric, output read as text.
    let registered = h.with_tables(vec![TableDef {
        name: "prices".into(),
        columns: vec![
            ColumnDef {
                primary_key: true,
                ..ColumnDef::new("id", "SERIAL")
            },
            ColumnDef::new("amount", "NUMERIC(10, 2)"),
        ],
    }]);
    let row = registered
        .crud
        .create(&prices, &fields(json!({ "amount": "7.25" })))
        .await
        .unwrap();
    assert_eq!(row["amount"], "7.25");

    let found = registered
        .crud
        .filter(&prices, &fields(json!({ "amount": "12.50" })))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["amount"], "12.50");
    h.teardown().await;
}

#[tokio::test]
#[ignore]
async fn null_binds_to_unregistered_integer_column() {
    let h = Harness::new().await;
    h.execute(&format!(
        "CREATE TABLE \"{}\".\"scores\" (id SERIAL PRIMARY KEY, contact_id INTEGER, \
         created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(), updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW())",
        h.schema
    ))
    .await;
    let scores = EntityName::from_path_segment("scores").unwrap();
    let row = h
        .state
        .crud
        .create(&scores, &fields(json!({ "contact_id": null })))
        .await
        .unwrap();
    assert_eq!(row["contact_id"], Value::Null);

    let id = row["id"].clone();
    let updated = h
        .state
        .crud
        .update(&scores, &id, &fields(json!({ "contact_id": 3 })))
        .await
        .unwrap();
    assert_eq!(updated["contact_id"], 3);
    h.teardown().await;
}

#[tokio::test]
#[ignore]
async fn http_create_filter_update_delete() {
    let h = Harness::new().await;

    let (status, created) = h
        .send(
            Method::POST,
            "/api/contacts",
            Some(json!({ "email": "a@x.com", "first_name": "A" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["email"], "a@x.com");
    let id = created["id"].as_i64().unwrap();

    let (status, rows) = h
        .send(Method::POST, "/api/contacts/filter", Some(json!({ "email": "a@x.com" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows, json!([created]));

    let (status, listed) = h.send(Method::GET, "/api/contacts/list?limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, updated) = h
        .send(
            Method::PUT,
            &format!("/api/contacts/update/{id}"),
            Some(json!({ "first_name": "B" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["first_name"], "B");

    let (status, body) = h.send(Method::DELETE, &format!("/api/contacts/delete/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["message"].as_str().unwrap().contains(&id.to_string()));

    let (status, body) = h
        .send(
            Method::PUT,
            &format!("/api/contacts/update/{id}"),
            Some(json!({ "first_name": "C" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, body) = h.send(Method::DELETE, &format!("/api/contacts/delete/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    h.teardown().await;
}

#[tokio::test]
#[ignore]
async fn http_hyphenated_entity_and_analytics() {
    let h = Harness::new().await;
    let (status, page) = h
        .send(
            Method::POST,
            "/api/landing-pages/create",
            Some(json!({ "name": "Home", "slug": "home", "design_json": ["hero"] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(page["design_json"], json!(["hero"]));

    h.send(Method::POST, "/api/telemetry", Some(json!({ "event_type": "page_view" })))
        .await;
    let (status, overview) = h.send(Method::GET, "/api/analytics/telemetry-overview", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview["total_events"], 1);
    assert_eq!(overview["by_event"][0]["event_type"], "page_view");
    h.teardown().await;
}
