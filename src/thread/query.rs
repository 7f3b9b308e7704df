//! # Query Descriptors
//!
//! Visualization messages carry the assistant's raw query object. Before it can
//! be shown (or opened as a new insight) it is cast to a known query kind and
//! wrapped in the node that displays it:
//!
//! ```text
//! answer.kind == HogQLQuery  →  DataVisualizationNode { source }
//! anything else we know      →  InsightVizNode { source, showHeader: true }
//! ```

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    Trends,
    Funnels,
    Retention,
    HogQL,
}

impl QueryKind {
    /// Parses a query `kind`, accepting the `Assistant`-prefixed forms the
    /// assistant emits.
    fn parse(kind: &str) -> Option<Self> {
        match kind.strip_prefix("Assistant").unwrap_or(kind) {
            "TrendsQuery" => Some(QueryKind::Trends),
            "FunnelsQuery" => Some(QueryKind::Funnels),
            "RetentionQuery" => Some(QueryKind::Retention),
            "HogQLQuery" => Some(QueryKind::HogQL),
            _ => None,
        }
    }

    fn wire_name(&self) -> &'static str {
        match self {
            QueryKind::Trends => "TrendsQuery",
            QueryKind::Funnels => "FunnelsQuery",
            QueryKind::Retention => "RetentionQuery",
            QueryKind::HogQL => "HogQLQuery",
        }
    }

    /// Short heading shown above a visualization.
    pub fn heading(&self) -> &'static str {
        match self {
            QueryKind::Trends => "Trends",
            QueryKind::Funnels => "Funnel",
            QueryKind::Retention => "Retention",
            QueryKind::HogQL => "SQL query",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    MissingKind,
    Unsupported(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::MissingKind => write!(f, "query has no kind"),
            QueryError::Unsupported(kind) => write!(f, "unsupported query type: {kind}"),
        }
    }
}

impl std::error::Error for QueryError {}

/// A query the product can execute, with its canonical `kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySource {
    pub kind: QueryKind,
    raw: Value,
}

/// Cast the assistant's answer into an executable query source.
pub fn cast_assistant_query(answer: &Value) -> Result<QuerySource, QueryError> {
    let kind_str = answer
        .get("kind")
        .and_then(Value::as_str)
        .ok_or(QueryError::MissingKind)?;
    let kind =
        QueryKind::parse(kind_str).ok_or_else(|| QueryError::Unsupported(kind_str.to_string()))?;

    let mut raw = answer.clone();
    if let Some(obj) = raw.as_object_mut() {
        obj.insert("kind".into(), Value::String(kind.wire_name().into()));
    }
    Ok(QuerySource { kind, raw })
}

impl QuerySource {
    pub fn is_hogql(&self) -> bool {
        self.kind == QueryKind::HogQL
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// SQL text of a HogQL query.
    pub fn sql(&self) -> Option<&str> {
        self.raw.get("query").and_then(Value::as_str)
    }

    /// One label per series: custom name, else event name, else "All events",
    /// prefixed by the aggregation when it isn't a plain total.
    pub fn series_labels(&self) -> Vec<String> {
        let Some(series) = self.raw.get("series").and_then(Value::as_array) else {
            return Vec::new();
        };
        series
            .iter()
            .map(|node| {
                let name = str_field(node, "custom_name")
                    .or_else(|| str_field(node, "event"))
                    .unwrap_or("All events");
                match str_field(node, "math") {
                    Some(math) if math != "total" => format!("{math} of {name}"),
                    _ => name.to_string(),
                }
            })
            .collect()
    }

    /// Property filters rendered as `key operator value`.
    pub fn property_filters(&self) -> Vec<String> {
        let Some(props) = self.raw.get("properties").and_then(Value::as_array) else {
            return Vec::new();
        };
        props
            .iter()
            .filter_map(|prop| {
                let key = str_field(prop, "key")?;
                let operator = str_field(prop, "operator").unwrap_or("exact");
                let value = match prop.get("value") {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Array(items)) => items
                        .iter()
                        .map(display_scalar)
                        .collect::<Vec<_>>()
                        .join(", "),
                    Some(other) => display_scalar(other),
                    None => String::new(),
                };
                Some(format!("{key} {operator} {value}").trim_end().to_string())
            })
            .collect()
    }

    pub fn breakdown(&self) -> Option<String> {
        match self.raw.get("breakdownFilter")?.get("breakdown")? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(display_scalar(other)),
        }
    }
}

fn str_field<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Serialize for QuerySource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

/// The node a query is displayed through.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind")]
pub enum QueryDescriptor {
    /// Raw SQL results, shown as a table/chart.
    #[serde(rename = "DataVisualizationNode")]
    DataVisualization { source: QuerySource },
    /// Structured insight with its own header.
    #[serde(rename = "InsightVizNode")]
    InsightViz {
        source: QuerySource,
        #[serde(rename = "showHeader")]
        show_header: bool,
    },
}

impl QueryDescriptor {
    pub fn from_source(source: QuerySource) -> Self {
        if source.is_hogql() {
            QueryDescriptor::DataVisualization { source }
        } else {
            QueryDescriptor::InsightViz {
                source,
                show_header: true,
            }
        }
    }

    pub fn source(&self) -> &QuerySource {
        match self {
            QueryDescriptor::DataVisualization { source }
            | QueryDescriptor::InsightViz { source, .. } => source,
        }
    }

    pub fn heading(&self) -> &'static str {
        self.source().kind.heading()
    }
}
