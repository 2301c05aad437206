//! # Query construction
//!
//! A DataTables request needs three statements that must agree on which rows match:
//!
//! 1. the total count, restricted only by the endpoint's own filter
//! 2. the filtered count, which adds the free-text search
//! 3. the page itself, which adds ordering and `LIMIT`/`OFFSET`
//!
//! All three come out of `compose`, which only varies the SELECT list and the trailing
//! clauses by `Mode`. Table, column and grouping expressions are trusted and written into
//! the SQL text; the values taken from the request (`search`, `length`, `start`) only ever
//! appear as the named placeholders `:search`, `:length` and `:start` and are bound when the
//! statement is rendered for a connection.

use crate::columns::ColumnSpec;
use crate::errors::{ApiError, QueryStage};
use crate::models::{PageLength, RequestParameters, SortDirection};
use crate::table::DataTable;
use sea_orm::{DbBackend, Statement, Value};

pub const SEARCH_PARAM: &str = "search";
pub const LENGTH_PARAM: &str = "length";
pub const START_PARAM: &str = "start";

// Basic safety limits
const MAX_SEARCH_QUERY_LENGTH: usize = 10_000;

/// Escape character declared on every LIKE term. `\` would depend on the server's
/// `NO_BACKSLASH_ESCAPES` mode.
pub const LIKE_ESCAPE: char = '!';

/// Escape LIKE wildcards so the search term matches literally
fn escape_like_wildcards(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

fn sanitize_search(term: &str) -> String {
    let truncated: String = term.chars().take(MAX_SEARCH_QUERY_LENGTH).collect();
    escape_like_wildcards(&truncated)
}

/// The three statements for one request, plus the values bound into them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySet {
    pub total_count: String,
    pub filtered_count: String,
    pub page: String,
    /// LIKE-escaped search term bound to `:search`.
    pub search: String,
    /// Bound to `:length`; `None` when the client asked for every row.
    pub length: Option<u64>,
    /// Bound to `:start`.
    pub start: u64,
}

#[derive(Debug, Clone, Copy)]
enum Mode<'a> {
    TotalCount,
    FilteredCount,
    Page {
        order_expr: &'a str,
        direction: SortDirection,
        paginate: bool,
    },
}

impl QuerySet {
    /// Build the statements for `source` as requested by `params`.
    ///
    /// # Errors
    ///
    /// - [`ApiError::InvalidConfiguration`] if `source` has no columns or an unnamed column
    /// - [`ApiError::OrderColumnOutOfRange`] if `params.order_column` is not a valid index
    pub fn build(source: &DataTable, params: &RequestParameters) -> Result<Self, ApiError> {
        source.validate()?;

        let columns = source.columns();
        let order_column = columns.get(params.order_column).ok_or_else(|| {
            ApiError::order_column_out_of_range(params.order_column, columns.len())
        })?;

        let length = match params.length {
            PageLength::All => None,
            PageLength::Rows(rows) => Some(rows),
        };

        let page = compose(
            source,
            Mode::Page {
                order_expr: order_column.order_expr(),
                direction: params.order_dir,
                paginate: length.is_some(),
            },
        );

        Ok(Self {
            total_count: compose(source, Mode::TotalCount),
            filtered_count: compose(source, Mode::FilteredCount),
            page,
            search: sanitize_search(&params.search),
            length,
            start: params.start,
        })
    }

    #[must_use]
    pub fn sql(&self, stage: QueryStage) -> &str {
        match stage {
            QueryStage::TotalCount => &self.total_count,
            QueryStage::FilteredCount => &self.filtered_count,
            QueryStage::Page => &self.page,
        }
    }

    /// Render the statement for `stage` with positional placeholders for `backend`.
    #[must_use]
    pub fn statement(&self, stage: QueryStage, backend: DbBackend) -> Statement {
        let (sql, values) = self.bind(self.sql(stage), backend);
        Statement::from_sql_and_values(backend, &sql, values)
    }

    fn bound_value(&self, name: &str) -> Option<Value> {
        match name {
            SEARCH_PARAM => Some(Value::from(self.search.clone())),
            LENGTH_PARAM => self.length.map(Value::from),
            START_PARAM => Some(Value::from(self.start)),
            _ => None,
        }
    }

    /// Replace every known `:name` placeholder by the backend's positional marker and
    /// collect the values in the order they appear.
    ///
    /// Colons inside quoted strings or backquoted identifiers, `::` casts and unknown names
    /// are left untouched. Inside quotes a backslash escapes the next character.
    fn bind(&self, sql: &str, backend: DbBackend) -> (String, Vec<Value>) {
        let mut rendered = String::with_capacity(sql.len());
        let mut values = Vec::new();
        let mut quote: Option<char> = None;
        let mut previous: Option<char> = None;
        let mut chars = sql.char_indices();

        while let Some((index, c)) = chars.next() {
            if let Some(open) = quote {
                rendered.push(c);
                if c == '\\' && open != '`' {
                    if let Some((_, escaped)) = chars.next() {
                        rendered.push(escaped);
                    }
                } else if c == open {
                    quote = None;
                }
                previous = Some(c);
                continue;
            }

            if matches!(c, '\'' | '"' | '`') {
                quote = Some(c);
            }

            let standalone = !previous.is_some_and(|p| is_identifier_char(p) || p == ':');
            if c == ':' && standalone {
                let after = &sql[index + 1..];
                let name_len = after
                    .find(|c: char| !is_identifier_char(c))
                    .unwrap_or(after.len());
                let name = &after[..name_len];

                if let Some(value) = self.bound_value(name) {
                    values.push(value);
                    match backend {
                        DbBackend::Postgres => rendered.push_str(&format!("${}", values.len())),
                        _ => rendered.push('?'),
                    }
                    // Identifier characters are ASCII, one byte each.
                    for _ in 0..name_len {
                        chars.next();
                    }
                    previous = name.chars().next_back();
                    continue;
                }
            }

            rendered.push(c);
            previous = Some(c);
        }

        (rendered, values)
    }
}

const fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Columns whose search expression joins the free-text disjunction.
#[must_use]
pub fn search_eligible_columns<'a>(
    columns: &'a [ColumnSpec],
    group_by: Option<&str>,
) -> Vec<&'a ColumnSpec> {
    columns
        .iter()
        .filter(|column| column.is_search_eligible(group_by))
        .collect()
}

/// `(a LIKE ... OR b LIKE ...)`, or `None` when no column is eligible.
#[must_use]
pub fn search_disjunction(columns: &[ColumnSpec], group_by: Option<&str>) -> Option<String> {
    let terms: Vec<String> = search_eligible_columns(columns, group_by)
        .into_iter()
        .map(|column| {
            format!(
                "{} LIKE CONCAT('%', :{SEARCH_PARAM}, '%') ESCAPE '{LIKE_ESCAPE}'",
                column.search_expr()
            )
        })
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(format!("({})", terms.join(" OR ")))
    }
}

fn select_list(columns: &[ColumnSpec], grouped: bool) -> String {
    columns
        .iter()
        .map(|column| {
            let expr = column.display_expr();
            if grouped {
                expr.to_string()
            } else {
                format!("IF(ISNULL({expr}), '', {expr})")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn where_clause(source: &DataTable, with_search: bool) -> Option<String> {
    let mut conditions = Vec::with_capacity(2);
    if let Some(filter) = source.additional_filter() {
        conditions.push(format!("({filter})"));
    }
    if with_search {
        conditions.extend(search_disjunction(source.columns(), source.grouping()));
    }

    if conditions.is_empty() {
        None
    } else {
        Some(conditions.join(" AND "))
    }
}

fn compose(source: &DataTable, mode: Mode<'_>) -> String {
    let group_by = source.grouping();

    let mut sql = String::from("SELECT ");
    match mode {
        Mode::Page { .. } => sql.push_str(&select_list(source.columns(), group_by.is_some())),
        Mode::TotalCount | Mode::FilteredCount => sql.push_str("COUNT(*)"),
    }
    sql.push_str(" FROM ");
    sql.push_str(source.table());

    if let Some(conditions) = where_clause(source, !matches!(mode, Mode::TotalCount)) {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions);
    }

    if let Some(group_by) = group_by {
        sql.push_str(" GROUP BY ");
        sql.push_str(group_by);
    }

    match mode {
        Mode::Page {
            order_expr,
            direction,
            paginate,
        } => {
            sql.push_str(&format!(" ORDER BY {order_expr} {direction}"));
            if paginate {
                sql.push_str(&format!(" LIMIT :{LENGTH_PARAM} OFFSET :{START_PARAM}"));
            }
            sql
        }
        // Count groups rather than rows.
        Mode::TotalCount | Mode::FilteredCount if group_by.is_some() => {
            format!("SELECT COUNT(*) FROM ({sql}) AS count_table")
        }
        Mode::TotalCount | Mode::FilteredCount => sql,
    }
}
