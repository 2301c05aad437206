use serde::Deserialize;
use serde_with::{DefaultOnError, DisplayFromStr, serde_as};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use utoipa::IntoParams;

/// Page size DataTables uses when the `length` field is missing or unreadable.
pub const DEFAULT_PAGE_LENGTH: u64 = 10;

/// Parameters sent by a DataTables client in server-side processing mode.
///
/// The client sends these as form values: in the query string for `GET`, or in an
/// `application/x-www-form-urlencoded` body for `POST`. Every numeric field is parsed
/// defensively: a missing or malformed value falls back to its default instead of
/// rejecting the request, so the widget always gets a reply it can render.
///
/// # Fields
/// - `search[value]`: free-text search term, default empty
/// - `order[0][column]`: zero-based index of the sort column, default `0`
/// - `order[0][dir]`: `asc` or `desc`, default `asc`
/// - `start`: row offset, default `0`
/// - `length`: page size, `-1` for no limit, default `10`
/// - `draw`: request counter echoed back in the response, default `0`
///
/// Only the first sort key (`order[0]`) is read.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RequestParameters {
    /// Free-text search term.
    #[serde(rename = "search[value]", default)]
    pub search: String,
    /// Index of the column to sort by.
    #[serde(rename = "order[0][column]", default)]
    #[serde_as(as = "DefaultOnError<DisplayFromStr>")]
    #[param(value_type = String, example = "0")]
    pub order_column: usize,
    /// Sort direction.
    #[serde(rename = "order[0][dir]", default)]
    #[serde_as(as = "DefaultOnError<DisplayFromStr>")]
    #[param(value_type = String, example = "asc")]
    pub order_dir: SortDirection,
    /// Offset of the first row on the page.
    #[serde(default)]
    #[serde_as(as = "DefaultOnError<DisplayFromStr>")]
    #[param(value_type = String, example = "0")]
    pub start: u64,
    /// Number of rows on the page, or `-1` for every row.
    #[serde(default)]
    #[serde_as(as = "DefaultOnError<DisplayFromStr>")]
    #[param(value_type = String, example = "10")]
    pub length: PageLength,
    /// Draw counter.
    #[serde(default)]
    #[serde_as(as = "DefaultOnError<DisplayFromStr>")]
    #[param(value_type = String, example = "1")]
    pub draw: i64,
}

impl RequestParameters {
    /// Builds parameters from raw form key/value pairs.
    ///
    /// Unknown keys, such as the per-column `columns[i][...]` fields, are ignored.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` only if the pairs cannot be read as a string map, which
    /// does not happen for string inputs; malformed values degrade to defaults.
    pub fn from_form_values<K, V>(
        values: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, serde_json::Error>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map: serde_json::Map<String, serde_json::Value> = values
            .into_iter()
            .map(|(key, value)| (key.into(), serde_json::Value::String(value.into())))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map))
    }
}

impl TryFrom<HashMap<String, String>> for RequestParameters {
    type Error = serde_json::Error;

    fn try_from(values: HashMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_form_values(values)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// SQL keyword, lowercase as the DataTables client sends it.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if trimmed.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(format!("invalid sort direction '{s}'"))
        }
    }
}

/// Requested page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLength {
    /// `length=-1`: return every matching row.
    All,
    Rows(u64),
}

impl Default for PageLength {
    fn default() -> Self {
        Self::Rows(DEFAULT_PAGE_LENGTH)
    }
}

impl fmt::Display for PageLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("-1"),
            Self::Rows(rows) => write!(f, "{rows}"),
        }
    }
}

impl FromStr for PageLength {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == "-1" {
            return Ok(Self::All);
        }
        trimmed.parse().map(Self::Rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(pairs: &[(&str, &str)]) -> RequestParameters {
        RequestParameters::from_form_values(pairs.iter().copied())
            .expect("string pairs always deserialize")
    }

    #[test]
    fn test_full_request() {
        let params = parse(&[
            ("draw", "5"),
            ("start", "20"),
            ("length", "10"),
            ("search[value]", "al"),
            ("search[regex]", "false"),
            ("order[0][column]", "1"),
            ("order[0][dir]", "desc"),
            ("columns[0][data]", "0"),
        ]);

        assert_eq!(
            params,
            RequestParameters {
                search: "al".to_string(),
                order_column: 1,
                order_dir: SortDirection::Desc,
                start: 20,
                length: PageLength::Rows(10),
                draw: 5,
            }
        );
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let params = parse(&[]);
        assert_eq!(params, RequestParameters::default());
        assert_eq!(params.length, PageLength::Rows(DEFAULT_PAGE_LENGTH));
    }

    #[test]
    fn test_malformed_numbers_degrade_to_defaults() {
        let params = parse(&[
            ("draw", "abc"),
            ("order[0][column]", "-3"),
            ("start", "ten"),
            ("length", "lots"),
        ]);

        assert_eq!(params.draw, 0);
        assert_eq!(params.order_column, 0);
        assert_eq!(params.start, 0);
        assert_eq!(params.length, PageLength::Rows(DEFAULT_PAGE_LENGTH));
    }

    #[test]
    fn test_unlimited_length() {
        assert_eq!(parse(&[("length", "-1")]).length, PageLength::All);
        assert_eq!(" -1 ".parse::<PageLength>(), Ok(PageLength::All));
        assert!("-5".parse::<PageLength>().is_err());
    }

    #[test]
    fn test_sort_direction_parsing() {
        assert_eq!("DESC".parse::<SortDirection>(), Ok(SortDirection::Desc));
        assert_eq!("asc".parse::<SortDirection>(), Ok(SortDirection::Asc));
        assert!("desc; DROP TABLE users".parse::<SortDirection>().is_err());

        let params = parse(&[("order[0][dir]", "sideways")]);
        assert_eq!(params.order_dir, SortDirection::Asc);
    }

    #[test]
    fn test_try_from_hash_map() {
        let mut values = HashMap::new();
        values.insert("draw".to_string(), "12".to_string());
        let params = RequestParameters::try_from(values).unwrap();
        assert_eq!(params.draw, 12);
    }
}
