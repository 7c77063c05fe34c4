//! Estimate ability offline from a JSON file of graded responses
//!
//! Accepts either a bare array or an object with an `observations` field:
//!
//! ```text
//! [{"difficulty": 50, "correct": true}, {"difficulty": 60, "correct": false}]
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use americano_adaptive::{
    AbilityObservation, AbilityStatus, AdaptiveEngine, InMemoryQuestionBank,
    InMemoryResponseStore,
};
use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;

use crate::config::ConfigLoader;

/// Arguments for the estimate command
#[derive(Debug, Args)]
pub struct EstimateArgs {
    /// JSON file of responses
    pub file: PathBuf,

    /// Print the full status as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ObservationFile {
    List(Vec<AbilityObservation>),
    Wrapped { observations: Vec<AbilityObservation> },
}

/// Run the estimate command
pub fn run(args: EstimateArgs) -> Result<()> {
    let contents = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let observations = parse_observations(&contents)
        .with_context(|| format!("parsing {}", args.file.display()))?;

    let config = ConfigLoader::load()?;
    let engine = AdaptiveEngine::new(
        config.adaptive,
        Arc::new(InMemoryResponseStore::new()),
        Arc::new(InMemoryQuestionBank::new()),
    );
    let status = engine.evaluate(&observations);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print!("{}", render(&status));
    }
    Ok(())
}

fn parse_observations(contents: &str) -> Result<Vec<AbilityObservation>> {
    let observations = match serde_json::from_str(contents)? {
        ObservationFile::List(list) => list,
        ObservationFile::Wrapped { observations } => observations,
    };
    if let Some(bad) = observations
        .iter()
        .find(|o| !(0.0..=100.0).contains(&o.difficulty))
    {
        anyhow::bail!("difficulty {} is outside 0-100", bad.difficulty);
    }
    Ok(observations)
}

fn render(status: &AbilityStatus) -> String {
    let mut out = format!("Responses:  {}\n", status.observation_count);
    if let (Some(theta), Some(ci)) = (status.display_theta, status.display_confidence_interval) {
        out.push_str(&format!("Ability:    {theta:.1} ± {ci:.1}\n"));
    }
    if let Some(estimate) = &status.estimate {
        out.push_str(&format!(
            "Logit:      {:.3} (SE {:.3}, {} iterations{})\n",
            estimate.theta,
            estimate.standard_error,
            estimate.iterations,
            if estimate.converged { "" } else { ", not converged" }
        ));
    }
    out.push_str(&format!(
        "Stop:       {}\n",
        if status.should_stop { "yes" } else { "no" }
    ));
    out.push_str(&format!("{}\n", status.message));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use americano_adaptive::AdaptiveConfig;

    fn engine() -> AdaptiveEngine {
        AdaptiveEngine::new(
            AdaptiveConfig::default(),
            Arc::new(InMemoryResponseStore::new()),
            Arc::new(InMemoryQuestionBank::new()),
        )
    }

    #[test]
    fn test_parse_bare_array() {
        let observations =
            parse_observations(r#"[{"difficulty": 50, "correct": true}]"#).unwrap();
        assert_eq!(observations.len(), 1);
        assert!(observations[0].correct);
    }

    #[test]
    fn test_parse_wrapped_object() {
        let observations = parse_observations(
            r#"{"observations": [{"difficulty": 40, "correct": false}, {"difficulty": 60, "correct": true}]}"#,
        )
        .unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].difficulty, 40.0);
    }

    #[test]
    fn test_parse_rejects_out_of_range_difficulty() {
        let err = parse_observations(r#"[{"difficulty": 140, "correct": true}]"#).unwrap_err();
        assert!(err.to_string().contains("140"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_observations("not json").is_err());
    }

    #[test]
    fn test_render_insufficient_data() {
        let status = engine().evaluate(&[AbilityObservation::new(50.0, true)]);
        let text = render(&status);
        assert!(text.contains("Responses:  1"));
        assert!(text.contains("Stop:       no"));
        assert!(text.contains("Need at least 3 responses"));
    }

    #[test]
    fn test_render_with_estimate() {
        let observations = vec![
            AbilityObservation::new(40.0, true),
            AbilityObservation::new(50.0, true),
            AbilityObservation::new(60.0, false),
            AbilityObservation::new(55.0, true),
        ];
        let text = render(&engine().evaluate(&observations));
        assert!(text.contains("Ability:"));
        assert!(text.contains("Logit:"));
    }
}
