//! Record store boundary
//!
//! The engine never talks to a database driver directly. Whatever executes
//! the SQL (a connection pool, a read replica, a test double) implements
//! [`RecordStore`]. Queries are always parameterized; implementations bind
//! `values` positionally and must not rewrite `text`.

use crate::search::query::SqlValue;
use crate::search::results::Lead;
use async_trait::async_trait;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Execute a row query and map each row to a [`Lead`], in query order
    async fn query(&self, text: &str, values: &[SqlValue]) -> anyhow::Result<Vec<Lead>>;

    /// Execute a `COUNT(*)` query and return the single count
    async fn count(&self, text: &str, values: &[SqlValue]) -> anyhow::Result<u64>;
}
