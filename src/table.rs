use crate::columns::ColumnSpec;
use crate::errors::ApiError;
use crate::executor::execute;
use crate::models::RequestParameters;
use crate::projection::{UnknownValuePolicy, project_rows};
use crate::query::QuerySet;
use crate::response::DataTablesResponse;
use sea_orm::ConnectionTrait;

/// A table (or view, or join) served to a DataTables client.
///
/// Built once at startup and shared by every request; it is never mutated afterwards.
///
/// ```rust
/// use tablecrate::{ColumnSpec, DataTable};
///
/// let people = DataTable::new(
///     "person",
///     [
///         ColumnSpec::new("id"),
///         ColumnSpec::new("name"),
///         ColumnSpec::new("email"),
///     ],
/// )
/// .filter("deleted_at IS NULL");
///
/// assert_eq!(people.columns().len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct DataTable {
    table: String,
    filter: Option<String>,
    group_by: Option<String>,
    columns: Vec<ColumnSpec>,
    unknown_values: UnknownValuePolicy,
}

impl DataTable {
    /// `table` is the FROM target and `columns` are listed in the order the client
    /// addresses them by index.
    #[must_use]
    pub fn new(table: impl Into<String>, columns: impl IntoIterator<Item = ColumnSpec>) -> Self {
        Self {
            table: table.into(),
            filter: None,
            group_by: None,
            columns: columns.into_iter().collect(),
            unknown_values: UnknownValuePolicy::default(),
        }
    }

    /// Extra condition applied to every statement, including the total count.
    #[must_use]
    pub fn filter(mut self, condition: impl Into<String>) -> Self {
        self.filter = Some(condition.into()).filter(|c| !c.is_empty());
        self
    }

    /// GROUP BY expression. Counts then count groups, and only columns named in the
    /// expression take part in the free-text search.
    #[must_use]
    pub fn group_by(mut self, expr: impl Into<String>) -> Self {
        self.group_by = Some(expr.into()).filter(|e| !e.is_empty());
        self
    }

    /// What to do with row values of a kind that has no JSON counterpart.
    #[must_use]
    pub fn unknown_values(mut self, policy: UnknownValuePolicy) -> Self {
        self.unknown_values = policy;
        self
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn additional_filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    #[must_use]
    pub fn grouping(&self) -> Option<&str> {
        self.group_by.as_deref()
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    #[must_use]
    pub const fn unknown_value_policy(&self) -> UnknownValuePolicy {
        self.unknown_values
    }

    /// # Errors
    ///
    /// Returns [`ApiError::InvalidConfiguration`] when the table name is empty, there are no
    /// columns, or a column has an empty name.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.table.is_empty() {
            return Err(ApiError::invalid_configuration("table name is empty"));
        }
        if self.columns.is_empty() {
            return Err(ApiError::invalid_configuration(format!(
                "table '{}' has no columns",
                self.table
            )));
        }
        if let Some(position) = self.columns.iter().position(|c| c.name().is_empty()) {
            return Err(ApiError::invalid_configuration(format!(
                "column {position} of table '{}' has an empty name",
                self.table
            )));
        }
        Ok(())
    }

    /// Answer one DataTables request.
    ///
    /// Runs the total count, the filtered count and the page query in that order. A failing
    /// page query is logged and answered with zero rows.
    ///
    /// # Errors
    ///
    /// - [`ApiError::InvalidConfiguration`] if [`validate`](Self::validate) fails
    /// - [`ApiError::OrderColumnOutOfRange`] for an order index past the last column
    /// - [`ApiError::Database`] if either count query fails
    #[tracing::instrument(skip_all, fields(table = %self.table, draw = params.draw))]
    pub async fn respond<C>(
        &self,
        db: &C,
        params: &RequestParameters,
    ) -> Result<DataTablesResponse, ApiError>
    where
        C: ConnectionTrait,
    {
        let queries = QuerySet::build(self, params)?;
        let outcome = execute(db, &queries).await?;
        let rows = project_rows(&outcome.rows, self.columns.len(), self.unknown_values);

        Ok(DataTablesResponse::assemble(
            params.draw,
            outcome.total,
            outcome.filtered,
            rows,
        ))
    }
}
