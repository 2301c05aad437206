use crate::projection::ProjectedRow;
use serde::{Serialize, Serializer};
use utoipa::ToSchema;

/// Body of a DataTables server-side processing reply.
///
/// `data` is serialized as the integer `0` when no row matched, which DataTables clients
/// read as an empty page.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataTablesResponse {
    /// `draw` from the request, echoed so the client can drop stale replies.
    pub draw: i64,
    /// Rows (or groups) before the search term is applied.
    pub records_total: u64,
    /// Rows (or groups) after the search term is applied.
    pub records_filtered: u64,
    /// Page rows, one array per row in column order.
    #[serde(serialize_with = "rows_or_zero")]
    #[schema(value_type = Object)]
    pub data: Vec<ProjectedRow>,
}

impl DataTablesResponse {
    #[must_use]
    pub fn assemble(
        draw: i64,
        records_total: u64,
        records_filtered: u64,
        data: Vec<ProjectedRow>,
    ) -> Self {
        Self {
            draw,
            records_total,
            records_filtered,
            data,
        }
    }
}

#[allow(clippy::ptr_arg)]
fn rows_or_zero<S: Serializer>(rows: &Vec<ProjectedRow>, serializer: S) -> Result<S::Ok, S::Error> {
    if rows.is_empty() {
        serializer.serialize_u8(0)
    } else {
        rows.serialize(serializer)
    }
}
