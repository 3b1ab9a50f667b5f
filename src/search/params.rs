//! Search input validation
//!
//! Raw requests are checked and default-filled into [`SearchParams`] before
//! anything else happens. Cache keys and SQL are both derived from the
//! validated form, so equivalent requests always look the same downstream.

use crate::core::config::SearchConfig;
use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Characters kept inside a free-text term; everything else could change
/// the meaning of a `tsquery`.
const TERM_PUNCTUATION: &[char] = &['@', '.', '_', '-'];

/// Unvalidated search input, as handed over by the service layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    pub fn with_company_size(mut self, size: impl Into<String>) -> Self {
        self.company_size = Some(size.into());
        self
    }

    pub fn with_page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort(mut self, sort_by: impl Into<String>, sort_order: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_order = Some(sort_order.into());
        self
    }

    /// Decode a loosely-typed parameter map, reporting the first field with
    /// the wrong shape. Unknown keys are ignored.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| Error::validation("params", "expected an object"))?;

        Ok(Self {
            query: string_field(map, "query", "query")?,
            industry: string_field(map, "industry", "industry")?,
            company_size: string_field(map, "companySize", "companySize")?,
            page: integer_field(map, "page")?,
            limit: integer_field(map, "limit")?,
            sort_by: string_field(map, "sortBy", "sortBy")?,
            sort_order: string_field(map, "sortOrder", "sortOrder")?,
        })
    }

    /// Validate and default-fill
    pub fn validate(&self, config: &SearchConfig) -> Result<SearchParams> {
        let page = match self.page {
            None => 1,
            Some(p) if p >= 1 && p <= u32::MAX as i64 => p as u32,
            Some(p) => return Err(Error::validation("page", format!("must be >= 1, got {}", p))),
        };

        let limit = match self.limit {
            None => config.default_limit,
            Some(l) if l >= 1 && l <= config.max_results as i64 => l as u32,
            Some(l) => {
                return Err(Error::validation(
                    "limit",
                    format!("must be between 1 and {}, got {}", config.max_results, l),
                ))
            }
        };

        let sort_by = match self.sort_by.as_deref().map(str::trim) {
            None | Some("") => SortField::Score,
            Some(name) => SortField::parse(name).ok_or_else(|| {
                Error::validation("sortBy", format!("unsupported sort field '{}'", name))
            })?,
        };

        let sort_order = match self.sort_order.as_deref().map(str::trim) {
            None | Some("") => SortOrder::Desc,
            Some(order) => SortOrder::parse(order).ok_or_else(|| {
                Error::validation("sortOrder", format!("must be 'asc' or 'desc', got '{}'", order))
            })?,
        };

        let query = match self.query.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                let terms = search_terms(raw);
                if terms.is_empty() {
                    return Err(Error::validation("query", "contains no searchable terms"));
                }
                Some(terms.join(" "))
            }
            _ => None,
        };

        Ok(SearchParams {
            query,
            industry: non_blank(self.industry.as_deref()),
            company_size: non_blank(self.company_size.as_deref()),
            page,
            limit,
            sort_by,
            sort_order,
        })
    }
}

/// Validated, default-filled search parameters.
///
/// Field order is the canonical serialization order used for cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Normalised terms, lowercase, single-space separated
    pub query: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl SearchParams {
    /// Rows skipped before this page
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

/// Columns a result page may be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Score,
    Name,
    Email,
    Industry,
    CompanySize,
    CreatedAt,
    LastEngagementScore,
}

impl SortField {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "score" => SortField::Score,
            "name" => SortField::Name,
            "email" => SortField::Email,
            "industry" => SortField::Industry,
            "companySize" | "company_size" => SortField::CompanySize,
            "createdAt" | "created_at" => SortField::CreatedAt,
            "lastEngagementScore" | "last_engagement_score" => SortField::LastEngagementScore,
            _ => return None,
        })
    }

    /// SQL expression for ORDER BY. `score` is the select alias.
    pub fn column(self) -> &'static str {
        match self {
            SortField::Score => "score",
            SortField::Name => "l.name",
            SortField::Email => "l.email",
            SortField::Industry => "l.industry",
            SortField::CompanySize => "l.company_size",
            SortField::CreatedAt => "l.created_at",
            SortField::LastEngagementScore => "l.last_engagement_score",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(order: &str) -> Option<Self> {
        if order.eq_ignore_ascii_case("asc") {
            Some(SortOrder::Asc)
        } else if order.eq_ignore_ascii_case("desc") {
            Some(SortOrder::Desc)
        } else {
            None
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Optional numeric adjustments to the query-layer score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringCriteria {
    pub additional_relevance: f64,
    pub additional_engagement: f64,
}

impl ScoringCriteria {
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| Error::validation("criteria", "expected an object"))?;

        let criteria = Self {
            additional_relevance: number_field(map, "additionalRelevance")?.unwrap_or(0.0),
            additional_engagement: number_field(map, "additionalEngagement")?.unwrap_or(0.0),
        };
        criteria.validate()?;
        Ok(criteria)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.additional_relevance.is_finite() {
            return Err(Error::validation("additionalRelevance", "must be a finite number"));
        }
        if !self.additional_engagement.is_finite() {
            return Err(Error::validation("additionalEngagement", "must be a finite number"));
        }
        Ok(())
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Split free text into lowercase terms.
///
/// Operator and other punctuation characters act as separators, the same way
/// the `english` text parser breaks `O'Brien` into `o` and `brien`.
pub fn search_terms(raw: &str) -> Vec<String> {
    raw.split(|c: char| !(c.is_alphanumeric() || TERM_PUNCTUATION.contains(&c)))
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|term| !term.is_empty())
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn string_field(map: &Map<String, Value>, key: &str, field: &'static str) -> Result<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(Error::validation(
            field,
            format!("expected a string, got {}", other),
        )),
    }
}

fn integer_field(map: &Map<String, Value>, key: &'static str) -> Result<Option<i64>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| Error::validation(key, format!("expected an integer, got {}", n))),
        Some(other) => Err(Error::validation(
            key,
            format!("expected an integer, got {}", other),
        )),
    }
}

fn number_field(map: &Map<String, Value>, key: &'static str) -> Result<Option<f64>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(other) => Err(Error::validation(
            key,
            format!("expected a number, got {}", other),
        )),
    }
}
