//! CLI command definitions and handlers

pub mod config;
pub mod explain;
pub mod score;

use crate::search::{ScoringCriteria, SearchRequest};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const LONG_ABOUT: &str = r#"
Operator tooling for the leadrank search engine.

COMMANDS:
    leadrank explain -q "director"      Show the SQL and bound values for a search
    leadrank score lead.json            Score one lead against the inference backend
    leadrank config                     Print the effective configuration

Configuration is read from $LEADRANK_HOME/config.toml (or --config).
Set LEADRANK_LOG=debug for verbose logging.
"#;

#[derive(Parser, Debug)]
#[command(name = "leadrank")]
#[command(author, version)]
#[command(about = "Lead search and scoring engine tools")]
#[command(long_about = LONG_ABOUT)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config.toml (defaults to $LEADRANK_HOME/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the parameterized query and cache key for a search
    Explain(ExplainArgs),

    /// Score a lead read from a JSON file
    Score(ScoreArgs),

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// Free-text query over name and email
    #[arg(short, long)]
    pub query: Option<String>,

    /// Exact industry filter
    #[arg(long)]
    pub industry: Option<String>,

    /// Exact company size filter
    #[arg(long)]
    pub company_size: Option<String>,

    /// Page number (1-based)
    #[arg(short, long)]
    pub page: Option<i64>,

    /// Page size
    #[arg(short, long)]
    pub limit: Option<i64>,

    /// Sort field
    #[arg(long)]
    pub sort_by: Option<String>,

    /// asc or desc
    #[arg(long)]
    pub sort_order: Option<String>,

    #[command(flatten)]
    pub criteria: CriteriaArgs,

    /// Also print the COUNT query
    #[arg(long)]
    pub count: bool,
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// JSON file holding one lead
    pub lead: PathBuf,

    #[command(flatten)]
    pub criteria: CriteriaArgs,
}

#[derive(Args, Debug, Default)]
pub struct CriteriaArgs {
    /// Additional relevance weight for the query-layer score
    #[arg(long, default_value_t = 0.0)]
    pub relevance: f64,

    /// Additional engagement weight for the query-layer score
    #[arg(long, default_value_t = 0.0)]
    pub engagement: f64,
}

impl CriteriaArgs {
    pub fn to_criteria(&self) -> ScoringCriteria {
        ScoringCriteria {
            additional_relevance: self.relevance,
            additional_engagement: self.engagement,
        }
    }
}

impl ExplainArgs {
    pub fn to_request(&self) -> SearchRequest {
        SearchRequest {
            query: self.query.clone(),
            industry: self.industry.clone(),
            company_size: self.company_size.clone(),
            page: self.page,
            limit: self.limit,
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order.clone(),
        }
    }
}
