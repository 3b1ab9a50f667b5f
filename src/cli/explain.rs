//! Explain command implementation

use crate::cache::{CacheCoordinator, MemoryCacheStore};
use crate::cli::ExplainArgs;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::search::QueryBuilder;
use serde_json::json;
use std::sync::Arc;

/// Run the explain command
pub fn run(args: ExplainArgs, config: &Config) -> Result<()> {
    let builder = QueryBuilder::new(config.search.clone());
    let criteria = args.criteria.to_criteria();

    let params = builder.validate(&args.to_request())?;
    let query = builder.build(&params, &criteria)?;

    // Key derivation needs no live store
    let keys = CacheCoordinator::new(Arc::new(MemoryCacheStore::new(1)), config.cache.clone());

    let mut output = json!({
        "params": params,
        "cacheKey": keys.derive_key_with(&params, &criteria),
        "query": query,
    });

    if args.count {
        output["count"] = serde_json::to_value(builder.build_count(&params))?;
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
