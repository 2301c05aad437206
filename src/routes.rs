use crate::errors::ApiError;
use crate::models::RequestParameters;
use crate::response::DataTablesResponse;
use crate::table::DataTable;
use axum::{
    Form, Json, Router,
    extract::{State, rejection::FormRejection},
    routing::get,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Shared state for a DataTables route.
#[derive(Clone)]
pub struct DataTableState {
    pub db: Arc<DatabaseConnection>,
    pub table: Arc<DataTable>,
}

/// Answers a DataTables request.
///
/// `GET` reads the parameters from the query string, `POST` from an urlencoded body.
///
/// # Errors
///
/// - `400 Bad Request` if the form cannot be read or the order column is out of range
/// - `500 Internal Server Error` if a count query fails or the table is misconfigured
pub async fn data_handler(
    State(state): State<DataTableState>,
    params: Result<Form<RequestParameters>, FormRejection>,
) -> Result<Json<DataTablesResponse>, ApiError> {
    let Form(params) = params.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let response = state.table.respond(state.db.as_ref(), &params).await?;
    Ok(Json(response))
}

impl DataTable {
    /// Router serving this table at `/` for both `GET` and `POST`.
    ///
    /// Takes the connection by value or as an `Arc` shared with other routers.
    ///
    /// ```rust,ignore
    /// let db = Arc::new(Database::connect(&url).await?);
    /// let app = Router::new().nest("/people", people.router(db.clone()));
    /// ```
    #[must_use]
    pub fn router(self, db: impl Into<Arc<DatabaseConnection>>) -> Router {
        let state = DataTableState {
            db: db.into(),
            table: Arc::new(self),
        };

        Router::new()
            .route("/", get(data_handler).post(data_handler))
            .with_state(state)
    }
}
