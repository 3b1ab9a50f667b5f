//! Parameterized lead query construction
//!
//! Every user-supplied literal becomes a positional parameter (`$1`, `$2`, ...).
//! The only caller-influenced fragments of the SQL text are the sort column
//! and direction, and both come from closed enums.

use crate::core::config::SearchConfig;
use crate::core::error::Result;
use crate::search::params::{ScoringCriteria, SearchParams, SearchRequest};
use serde::Serialize;
use std::fmt::Write;
use tracing::debug;

/// Leads table alias used throughout the generated SQL
const LEADS_FROM: &str = "FROM leads l";

/// Text-search configuration passed to `to_tsvector` / `to_tsquery`
const TS_CONFIG: &str = "english";

/// Searchable document: name and email concatenated
const SEARCH_DOCUMENT: &str = "coalesce(l.name, '') || ' ' || coalesce(l.email, '')";

/// A bound query parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl SqlValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

/// SQL text plus its ordered parameter values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryObject {
    pub text: String,
    pub values: Vec<SqlValue>,
}

/// Builds search and count queries from validated parameters
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    config: SearchConfig,
}

impl QueryBuilder {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Validate and default-fill a raw request
    pub fn validate(&self, request: &SearchRequest) -> Result<SearchParams> {
        request.validate(&self.config)
    }

    /// Build the page query: filters, query-layer score, ordering, pagination
    pub fn build(&self, params: &SearchParams, criteria: &ScoringCriteria) -> Result<QueryObject> {
        criteria.validate()?;

        let mut binds = Binds::default();

        // Query-layer score lets ORDER BY work without per-row inference
        let relevance = binds.push(SqlValue::Float(criteria.additional_relevance.max(0.0)));
        let engagement = binds.push(SqlValue::Float(criteria.additional_engagement.max(0.0)));

        let mut text = format!(
            "SELECT l.*, ({}::float8 + {}::float8) AS score {}",
            relevance, engagement, LEADS_FROM
        );

        push_filters(&mut text, &mut binds, params);

        let limit = binds.push(SqlValue::Integer(params.limit as i64));
        let offset = binds.push(SqlValue::Integer(params.offset() as i64));

        let _ = write!(
            text,
            " ORDER BY {} {}, l.id ASC LIMIT {} OFFSET {}",
            params.sort_by.column(),
            params.sort_order.as_sql(),
            limit,
            offset
        );

        debug!(params = binds.values.len(), "Built lead search query");

        Ok(QueryObject {
            text,
            values: binds.values,
        })
    }

    /// Build a COUNT over the same filters, ignoring pagination
    pub fn build_count(&self, params: &SearchParams) -> QueryObject {
        let mut binds = Binds::default();
        let mut text = format!("SELECT COUNT(*) AS total {}", LEADS_FROM);
        push_filters(&mut text, &mut binds, params);

        QueryObject {
            text,
            values: binds.values,
        }
    }
}

/// Positional parameter accumulator
#[derive(Default)]
struct Binds {
    values: Vec<SqlValue>,
}

impl Binds {
    /// Bind a value and return its placeholder
    fn push(&mut self, value: SqlValue) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }
}

fn push_filters(text: &mut String, binds: &mut Binds, params: &SearchParams) {
    let mut clauses = Vec::new();

    if let Some(query) = &params.query {
        // All terms must match
        let tsquery = query.split_whitespace().collect::<Vec<_>>().join(" & ");
        let placeholder = binds.push(SqlValue::Text(tsquery));
        clauses.push(format!(
            "to_tsvector('{cfg}', {doc}) @@ to_tsquery('{cfg}', {placeholder})",
            cfg = TS_CONFIG,
            doc = SEARCH_DOCUMENT,
            placeholder = placeholder
        ));
    }

    if let Some(industry) = &params.industry {
        let placeholder = binds.push(SqlValue::Text(industry.clone()));
        clauses.push(format!("l.industry = {}", placeholder));
    }

    if let Some(size) = &params.company_size {
        let placeholder = binds.push(SqlValue::Text(size.clone()));
        clauses.push(format!("l.company_size = {}", placeholder));
    }

    if !clauses.is_empty() {
        text.push_str(" WHERE ");
        text.push_str(&clauses.join(" AND "));
    }
}
