pub mod config;
pub mod error;

pub use config::{Config, MAX_SEARCH_RESULTS};
pub use error::{Error, Result};
