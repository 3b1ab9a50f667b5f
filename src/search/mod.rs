pub mod engine;
pub mod params;
pub mod query;
pub mod results;

pub use engine::SearchEngine;
pub use params::{ScoringCriteria, SearchParams, SearchRequest, SortField, SortOrder};
pub use query::{QueryBuilder, QueryObject, SqlValue};
pub use results::{Lead, ScoredLead, SearchResult};
