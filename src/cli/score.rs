//! Score command implementation

use crate::ai::OllamaInference;
use crate::cli::ScoreArgs;
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::scoring::ScoringEngine;
use crate::search::{Lead, ScoredLead};
use std::sync::Arc;
use tracing::info;

/// Run the score command
pub async fn run(args: ScoreArgs, config: &Config) -> Result<()> {
    let content = std::fs::read_to_string(&args.lead)?;
    let lead: Lead = serde_json::from_str(&content)?;

    let criteria = args.criteria.to_criteria();
    criteria.validate()?;

    let inference = OllamaInference::new(&config.inference).map_err(|e| Error::Config {
        message: e.to_string(),
    })?;
    info!(model = %inference.model(), lead = %lead.id, "Scoring lead");

    let engine = ScoringEngine::new(Arc::new(inference), config.scoring.clone());
    let final_score = engine.score(&lead, &criteria).await;

    let scored = ScoredLead { lead, final_score };
    println!("{}", serde_json::to_string_pretty(&scored)?);
    Ok(())
}
