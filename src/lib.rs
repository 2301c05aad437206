//! # tablecrate
//!
//! Server-side processing for [DataTables](https://datatables.net) on Axum and Sea-ORM.
//!
//! Describe the table once, mount its router, and every draw request from the widget is
//! answered with a total count, a filtered count and the requested page:
//!
//! ```rust,ignore
//! use tablecrate::{ColumnSpec, DataTable};
//!
//! let people = DataTable::new(
//!     "person",
//!     [
//!         ColumnSpec::new("id"),
//!         ColumnSpec::new("name"),
//!         ColumnSpec::new("created_at").display("DATE_FORMAT(created_at, '%Y-%m-%d')"),
//!     ],
//! )
//! .filter("deleted_at IS NULL");
//!
//! let app = axum::Router::new().nest("/people", people.router(db));
//! ```
//!
//! Statements are written for MySQL (`IF`, `ISNULL`, `CONCAT`).

pub mod columns;
pub mod errors;
pub mod executor;
pub mod models;
pub mod projection;
pub mod query;
pub mod response;
pub mod routes;
pub mod table;

pub use columns::ColumnSpec;
pub use errors::{ApiError, QueryStage};
pub use models::{PageLength, RequestParameters, SortDirection};
pub use projection::{CellValue, ProjectedRow, UnknownValuePolicy};
pub use query::QuerySet;
pub use response::DataTablesResponse;
pub use table::DataTable;
