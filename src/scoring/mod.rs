//! Composite lead scoring

mod engine;
pub mod prompt;

pub use engine::ScoringEngine;
