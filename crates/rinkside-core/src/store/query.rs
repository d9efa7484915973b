use serde::Serialize;
use serde_json::Value;

/// A single row filter, rendered as a REST query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Neq(String, Value),
    In(String, Vec<Value>),
    IsNull(String),
    /// Case-insensitive pattern match; `*` is the wildcard.
    ILike(String, String),
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _)
            | Filter::Neq(c, _)
            | Filter::In(c, _)
            | Filter::IsNull(c)
            | Filter::ILike(c, _) => c,
        }
    }

    fn render(&self) -> String {
        match self {
            Filter::Eq(_, v) => format!("eq.{}", render_scalar(v)),
            Filter::Neq(_, v) => format!("neq.{}", render_scalar(v)),
            Filter::In(_, values) => {
                let items: Vec<String> = values.iter().map(render_list_item).collect();
                format!("in.({})", items.join(","))
            }
            Filter::IsNull(_) => "is.null".to_string(),
            Filter::ILike(_, pattern) => format!("ilike.{}", pattern),
        }
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// List members are double-quoted so commas and parentheses survive.
fn render_list_item(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        other => render_scalar(other),
    }
}

fn to_value<V: Serialize>(value: V) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Row selection for one table: filters, ordering and a limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Vec<(String, bool)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq<V: Serialize>(mut self, column: &str, value: V) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), to_value(value)));
        self
    }

    pub fn neq<V: Serialize>(mut self, column: &str, value: V) -> Self {
        self.filters.push(Filter::Neq(column.to_string(), to_value(value)));
        self
    }

    pub fn is_in<V: Serialize>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(to_value).collect();
        self.filters.push(Filter::In(column.to_string(), values));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.filters.push(Filter::IsNull(column.to_string()));
        self
    }

    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.filters.push(Filter::ILike(column.to_string(), pattern.to_string()));
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_string(), ascending));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_filtered(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Updates and deletes must name their rows; an unfiltered mutation
    /// would touch every row the session can see.
    pub fn ensure_filtered(&self, table: &str) -> anyhow::Result<()> {
        if self.is_filtered() {
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                "Refusing to mutate every row of '{}': query has no filters",
                table
            ))
        }
    }

    /// Render as REST query parameters, `select=*` first.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(
            self.filters
                .iter()
                .map(|f| (f.column().to_string(), f.render())),
        );
        if !self.order.is_empty() {
            let order: Vec<String> = self
                .order
                .iter()
                .map(|(col, asc)| format!("{}.{}", col, if *asc { "asc" } else { "desc" }))
                .collect();
            params.push(("order".to_string(), order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_to_params() {
        let team = Uuid::parse_str("0e65066c-ab20-4da0-b3bf-79dfd0668049").unwrap();
        let query = Query::new()
            .eq("team_id", team)
            .neq("status", "cancelled")
            .order_by("last_name", true)
            .order_by("first_name", true)
            .limit(25);

        assert_eq!(
            query.to_params(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("team_id".to_string(), "eq.0e65066c-ab20-4da0-b3bf-79dfd0668049".to_string()),
                ("status".to_string(), "neq.cancelled".to_string()),
                ("order".to_string(), "last_name.asc,first_name.asc".to_string()),
                ("limit".to_string(), "25".to_string()),
            ]
        );
    }

    #[test]
    fn test_in_filter_quotes_strings() {
        let query = Query::new()
            .is_in("last_name", ["Smith", "O\"Reilly, Jr"])
            .is_in("jersey_number", [9, 97]);
        let params = query.to_params();
        assert_eq!(params[1].1, r#"in.("Smith","O\"Reilly, Jr")"#);
        assert_eq!(params[2].1, "in.(9,97)");
    }

    #[test]
    fn test_null_and_ilike() {
        let params = Query::new()
            .is_null("end_date")
            .ilike("email", "*@rinkside.app")
            .to_params();
        assert_eq!(params[1], ("end_date".to_string(), "is.null".to_string()));
        assert_eq!(params[2], ("email".to_string(), "ilike.*@rinkside.app".to_string()));
    }

    #[test]
    fn test_ensure_filtered() {
        assert!(Query::new().ensure_filtered("teams").is_err());
        assert!(Query::new().order_by("name", true).ensure_filtered("teams").is_err());
        assert!(Query::new().eq("id", 1).ensure_filtered("teams").is_ok());
    }
}
