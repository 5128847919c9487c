use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Top-level field, or a dotted path into nested objects
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn matches(&self, document: &Value) -> bool {
        let Some(actual) = lookup(document, &self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => actual == &self.value || compare(actual, &self.value) == Some(Ordering::Equal),
            FilterOp::Gte => matches!(compare(actual, &self.value), Some(Ordering::Greater | Ordering::Equal)),
            FilterOp::Lte => matches!(compare(actual, &self.value), Some(Ordering::Less | Ordering::Equal)),
        }
    }
}

/// Equality/range filters, descending order on one field, and a limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by_desc: Option<String>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Gte, value)
    }

    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Lte, value)
    }

    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by_desc = Some(field.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(document))
    }

    /// Filter, sort and truncate an unordered set of documents.
    pub fn apply(&self, documents: impl IntoIterator<Item = Value>) -> Vec<Value> {
        let mut matched: Vec<Value> = documents.into_iter().filter(|d| self.matches(d)).collect();
        if let Some(field) = &self.order_by_desc {
            matched.sort_by(|a, b| {
                let ord = match (lookup(a, field), lookup(b, field)) {
                    (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Greater,
                    (None, Some(_)) => Ordering::Less,
                    (None, None) => Ordering::Equal,
                };
                ord.reverse()
            });
        }
        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(document, |value, key| value.get(key))
}

/// Order two JSON scalars. RFC 3339 strings compare as instants, so
/// `...:00.5Z` sorts after `...:00Z`.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => {
            match (
                chrono::DateTime::parse_from_rfc3339(x),
                chrono::DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => Some(x.cmp(&y)),
                _ => Some(x.cmp(y)),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs() -> Vec<Value> {
        vec![
            json!({"id": "a", "city": "Tucson", "score": 0.95, "at": "2024-03-01T10:00:00Z"}),
            json!({"id": "b", "city": "Tucson", "score": 0.6, "at": "2024-03-01T10:00:00.500Z"}),
            json!({"id": "c", "city": "Phoenix", "score": 0.9, "at": "2024-02-28T09:00:00Z"}),
            json!({"id": "d", "city": "Tucson", "score": 0.89999, "at": "2024-03-02T00:00:00Z"}),
        ]
    }

    fn ids(docs: &[Value]) -> Vec<&str> {
        docs.iter().map(|d| d["id"].as_str().unwrap()).collect()
    }

    #[test]
    fn range_filter_is_inclusive() {
        let result = Query::new().gte("score", 0.9).apply(docs());
        assert_eq!(ids(&result), vec!["a", "c"]);
    }

    #[test]
    fn timestamps_order_as_instants() {
        let result = Query::new().eq("city", "Tucson").order_by_desc("at").apply(docs());
        assert_eq!(ids(&result), vec!["d", "b", "a"]);
    }

    #[test]
    fn limit_applies_after_ordering() {
        let result = Query::new().order_by_desc("at").limit(2).apply(docs());
        assert_eq!(ids(&result), vec!["d", "b"]);
    }

    #[test]
    fn date_window() {
        let result = Query::new()
            .gte("at", "2024-03-01T00:00:00Z")
            .lte("at", "2024-03-01T23:59:59Z")
            .apply(docs());
        assert_eq!(ids(&result), vec!["a", "b"]);
    }

    #[test]
    fn missing_field_never_matches() {
        let result = Query::new().eq("state", "AZ").apply(docs());
        assert!(result.is_empty());
    }

    #[test]
    fn nested_paths() {
        let doc = json!({"source_listing": {"source": "cars.com"}});
        assert!(Query::new().eq("source_listing.source", "cars.com").matches(&doc));
    }
}
