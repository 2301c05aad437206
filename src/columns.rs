/// A column taking part in a DataTables endpoint.
///
/// `name` is the underlying column (or grouping key) identifier. The three overrides change
/// how the column is searched, rendered in the SELECT list, and ordered. An override left
/// unset, or set to an empty string, falls back to `name`.
///
/// Column expressions are concatenated into SQL text as-is, so they must come from the
/// application, never from the request.
///
/// ```rust
/// use tablecrate::ColumnSpec;
///
/// let column = ColumnSpec::new("created_at")
///     .display("DATE_FORMAT(created_at, '%Y-%m-%d')")
///     .search("DATE_FORMAT(created_at, '%Y-%m-%d')");
///
/// assert_eq!(column.order_expr(), "created_at");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    name: String,
    search: Option<String>,
    display: Option<String>,
    order: Option<String>,
}

impl ColumnSpec {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            search: None,
            display: None,
            order: None,
        }
    }

    /// Expression matched against the free-text search term.
    #[must_use]
    pub fn search(mut self, expr: impl Into<String>) -> Self {
        self.search = non_empty(expr.into());
        self
    }

    /// Expression placed in the SELECT list.
    #[must_use]
    pub fn display(mut self, expr: impl Into<String>) -> Self {
        self.display = non_empty(expr.into());
        self
    }

    /// Expression used in ORDER BY when the client sorts on this column.
    #[must_use]
    pub fn order(mut self, expr: impl Into<String>) -> Self {
        self.order = non_empty(expr.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn search_override(&self) -> Option<&str> {
        self.search.as_deref()
    }

    #[must_use]
    pub fn search_expr(&self) -> &str {
        self.search.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub fn display_expr(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub fn order_expr(&self) -> &str {
        self.order.as_deref().unwrap_or(&self.name)
    }

    /// Whether this column may carry a LIKE filter once rows are collapsed by `group_by`.
    ///
    /// Either the column name or its search override has to occur in the grouping
    /// expression as a whole identifier.
    #[must_use]
    pub fn is_search_eligible(&self, group_by: Option<&str>) -> bool {
        let Some(group_by) = group_by else {
            return true;
        };

        contains_identifier(group_by, &self.name)
            || self
                .search_override()
                .is_some_and(|search| contains_identifier(group_by, search))
    }
}

fn non_empty(expr: String) -> Option<String> {
    if expr.is_empty() { None } else { Some(expr) }
}

const fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Finds `needle` in `haystack` where it is not glued to a neighbouring identifier character,
/// so that `id` is not found inside `department_id`.
fn contains_identifier(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }

    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        let starts_clean = !needle.starts_with(is_identifier_char)
            || !before.is_some_and(is_identifier_char);
        let ends_clean =
            !needle.ends_with(is_identifier_char) || !after.is_some_and(is_identifier_char);
        starts_clean && ends_clean
    })
}
