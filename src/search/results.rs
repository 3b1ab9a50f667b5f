use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Lead row as returned by the record store.
///
/// Accepts both camelCase and raw column names, so a row serialized straight
/// from `SELECT l.*` decodes as-is. Columns the engine does not know about are
/// kept in `extra` and passed through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(deserialize_with = "lead_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, alias = "company_size", skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,
    #[serde(
        default,
        alias = "last_engagement_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_engagement_score: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Lead {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Industry or company size is known
    pub fn has_firmographics(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.industry) || present(&self.company_size)
    }
}

/// Primary keys may be text or integer columns
fn lead_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or integer id, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredLead {
    #[serde(flatten)]
    pub lead: Lead,
    pub final_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub data: Vec<ScoredLead>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl SearchResult {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
