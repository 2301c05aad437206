use crate::errors::{ApiError, QueryStage};
use crate::query::QuerySet;
use sea_orm::{ConnectionTrait, DbErr, QueryResult};

/// What the database returned for one request.
#[derive(Debug)]
pub struct QueryOutcome {
    pub total: u64,
    pub filtered: u64,
    /// Page rows; empty when the page query failed.
    pub rows: Vec<QueryResult>,
}

async fn count<C>(db: &C, queries: &QuerySet, stage: QueryStage) -> Result<u64, ApiError>
where
    C: ConnectionTrait,
{
    let statement = queries.statement(stage, db.get_database_backend());
    tracing::debug!(stage = %stage, sql = %statement.sql, "Running DataTables query");

    let row = db
        .query_one(statement)
        .await
        .map_err(|err| ApiError::query_failed(stage, err))?;

    let Some(row) = row else {
        return Ok(0);
    };

    let value: i64 = row
        .try_get_by_index(0)
        .map_err(|err| ApiError::query_failed(stage, err))?;

    u64::try_from(value).map_err(|_| {
        ApiError::query_failed(
            stage,
            DbErr::Type(format!("{stage} query returned a negative count: {value}")),
        )
    })
}

/// Run the total count, filtered count and page statements, in that order.
///
/// # Errors
///
/// Returns [`ApiError::Database`] if either count statement fails. A failing page
/// statement is logged and reported as an empty page.
pub async fn execute<C>(db: &C, queries: &QuerySet) -> Result<QueryOutcome, ApiError>
where
    C: ConnectionTrait,
{
    let total = count(db, queries, QueryStage::TotalCount).await?;
    let filtered = count(db, queries, QueryStage::FilteredCount).await?;

    let statement = queries.statement(QueryStage::Page, db.get_database_backend());
    tracing::debug!(stage = %QueryStage::Page, sql = %statement.sql, "Running DataTables query");

    let rows = match db.query_all(statement).await {
        Ok(rows) => rows,
        Err(err) => {
            tracing::warn!(error = ?err, "Page query failed, answering with zero rows");
            Vec::new()
        }
    };

    Ok(QueryOutcome {
        total,
        filtered,
        rows,
    })
}
