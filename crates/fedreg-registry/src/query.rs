//! List query parameters: attribute filters, sorting, offset and pagination

use fedreg_core::{Error, Result};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Parsed list query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    /// Number of items skipped after sorting
    pub skip: usize,
    /// Maximum number of items after `skip`
    pub limit: Option<usize>,
    /// Sort field, descending when prefixed with `-`
    pub sort: Option<String>,
    /// Zero-based page index, used with `size`
    pub page: usize,
    /// Page size
    pub size: Option<usize>,
    /// Include connected entities
    pub with_conn: bool,
    /// Public projection even for authenticated callers
    pub short: bool,
    /// Attribute equality filters
    pub filters: Vec<(String, String)>,
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::validation(format!("Invalid value '{value}' for query parameter '{key}'")))
}

impl ListParams {
    /// Split raw query pairs into known parameters and attribute filters
    pub fn from_query(query: HashMap<String, String>) -> Result<Self> {
        let mut params = Self::default();
        for (key, value) in query {
            match key.as_str() {
                "skip" => params.skip = parse(&key, &value)?,
                "limit" => params.limit = Some(parse(&key, &value)?),
                "sort" => params.sort = Some(value).filter(|s| !s.is_empty()),
                "page" => params.page = parse(&key, &value)?,
                "size" => {
                    let size: usize = parse(&key, &value)?;
                    if size == 0 {
                        return Err(Error::validation("Page size must be greater than 0"));
                    }
                    params.size = Some(size);
                }
                "with_conn" => params.with_conn = parse(&key, &value)?,
                "short" => params.short = parse(&key, &value)?,
                _ => params.filters.push((key, value)),
            }
        }
        params.filters.sort();
        Ok(params)
    }

    /// Whether a rendered node satisfies every filter
    pub fn matches(&self, item: &Map<String, Value>) -> bool {
        self.filters.iter().all(|(key, expected)| match item.get(key) {
            Some(Value::String(s)) => s == expected,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == *expected,
        })
    }

    /// Filter, sort and slice rendered nodes. Sorting and filtering look at
    /// `keys` (all attributes) while the output keeps the matching `items`.
    pub fn apply<T>(&self, rows: Vec<(Map<String, Value>, T)>) -> Vec<T> {
        let mut rows: Vec<_> = rows.into_iter().filter(|(keys, _)| self.matches(keys)).collect();

        if let Some(sort) = &self.sort {
            let (field, descending) = match sort.strip_prefix('-') {
                Some(field) => (field, true),
                None => (sort.as_str(), false),
            };
            rows.sort_by(|(a, _), (b, _)| {
                let ord = compare(a.get(field), b.get(field));
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        let items = rows
            .into_iter()
            .map(|(_, item)| item)
            .skip(self.skip)
            .take(self.limit.unwrap_or(usize::MAX));

        match self.size {
            Some(size) => items
                .skip(self.page.saturating_mul(size))
                .take(size)
                .collect(),
            None => items.collect(),
        }
    }
}

fn rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(_) => 4,
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn row(name: &str, vcpus: u64, public: bool) -> (Map<String, Value>, String) {
        let Value::Object(map) = json!({"name": name, "vcpus": vcpus, "is_public": public}) else {
            unreachable!()
        };
        (map, name.to_string())
    }

    #[test]
    fn test_from_query_splits_filters() {
        let params = ListParams::from_query(query(&[
            ("skip", "1"),
            ("sort", "-name"),
            ("with_conn", "true"),
            ("name", "tiny"),
        ]))
        .unwrap();
        assert_eq!(params.skip, 1);
        assert_eq!(params.sort.as_deref(), Some("-name"));
        assert!(params.with_conn);
        assert!(!params.short);
        assert_eq!(params.filters, vec![("name".to_string(), "tiny".to_string())]);
    }

    #[test]
    fn test_from_query_rejects_bad_numbers() {
        let err = ListParams::from_query(query(&[("limit", "many")])).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(ListParams::from_query(query(&[("size", "0")])).is_err());
    }

    #[test]
    fn test_filter_on_non_string_fields() {
        let params = ListParams::from_query(query(&[("is_public", "false")])).unwrap();
        let out = params.apply(vec![row("a", 1, true), row("b", 2, false)]);
        assert_eq!(out, vec!["b"]);

        let params = ListParams::from_query(query(&[("vcpus", "1")])).unwrap();
        let out = params.apply(vec![row("a", 1, true), row("b", 2, false)]);
        assert_eq!(out, vec!["a"]);
    }

    #[test]
    fn test_sort_descending_then_slice() {
        let params = ListParams::from_query(query(&[("sort", "-vcpus"), ("skip", "1"), ("limit", "2")])).unwrap();
        let out = params.apply(vec![row("a", 1, true), row("b", 4, true), row("c", 2, true), row("d", 3, true)]);
        assert_eq!(out, vec!["d", "c"]);
    }

    #[test]
    fn test_pagination() {
        let params = ListParams::from_query(query(&[("sort", "name"), ("page", "1"), ("size", "2")])).unwrap();
        let out = params.apply(vec![row("c", 1, true), row("a", 1, true), row("e", 1, true), row("b", 1, true), row("d", 1, true)]);
        assert_eq!(out, vec!["c", "d"]);
    }
}
