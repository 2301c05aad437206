#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use sea_orm::{
    DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, Transaction, Value,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tablecrate::{ColumnSpec, DataTable};
use tower::ServiceExt;

pub type MockRow = BTreeMap<&'static str, Value>;

/// `{id, name, email}` on the `person` table.
pub fn people_table() -> DataTable {
    DataTable::new(
        "person",
        [
            ColumnSpec::new("id"),
            ColumnSpec::new("name"),
            ColumnSpec::new("email"),
        ],
    )
}

/// `{id, department, salary}` on `employee`, grouped by department.
pub fn department_table() -> DataTable {
    DataTable::new(
        "employee",
        [
            ColumnSpec::new("id").display("MIN(id)"),
            ColumnSpec::new("department"),
            ColumnSpec::new("salary").display("SUM(salary)"),
        ],
    )
    .group_by("department")
}

pub fn count_row(count: i64) -> MockRow {
    BTreeMap::from([("COUNT(*)", count.into())])
}

/// Page row as MySQL returns it for an ungrouped query, every cell already a string.
/// Keys are prefixed so the mock keeps them in SELECT order.
pub fn person_row(id: &str, name: &str, email: &str) -> MockRow {
    BTreeMap::from([
        ("c0_id", id.into()),
        ("c1_name", name.into()),
        ("c2_email", email.into()),
    ])
}

pub fn mock_db(total: i64, filtered: i64, rows: Vec<MockRow>) -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![count_row(total)]])
        .append_query_results([vec![count_row(filtered)]])
        .append_query_results([rows])
        .into_connection()
}

pub fn mock_db_with_failing_page(total: i64, filtered: i64) -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![count_row(total)]])
        .append_query_results([vec![count_row(filtered)]])
        .append_query_errors([DbErr::Custom("Unknown column 'nmae'".to_string())])
        .into_connection()
}

pub fn setup_test_app(table: DataTable, db: Arc<DatabaseConnection>) -> Router {
    Router::new().nest("/api/v1/people", table.router(db))
}

/// Statements the mock received so far. Takes the last handle to the shared
/// connection, since sea-orm only exposes the log through `into_transaction_log`.
pub fn transaction_log(db: Arc<DatabaseConnection>) -> Vec<Transaction> {
    Arc::try_unwrap(db)
        .expect("connection still shared")
        .into_transaction_log()
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_form(app: Router, uri: &str, form: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Query string the DataTables client sends, with bracketed keys percent-encoded.
pub fn datatables_query(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                url_escape::encode_component(key),
                url_escape::encode_component(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
