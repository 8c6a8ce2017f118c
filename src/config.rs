//! Run configuration for the processing pipeline.

use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tracker::{LabelFilter, MatchPolicy, TraceReport, TrackerConfig, ZoneSpec};

/// Everything a `Processor` needs besides its collaborators.
///
/// Every field has a default, so a JSON file only lists what it changes:
///
/// ```json
/// { "zone": { "kind": "anchored", "x": 0, "y": 125 }, "tolerance": 12.5 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessorConfig {
    pub zone: ZoneSpec,
    /// Maximum center distance for continuing a trace
    pub tolerance: f64,
    /// Trace length at which an identity is counted
    pub min_trace_length: usize,
    /// Detection workers; `None` uses the available parallelism
    pub workers: Option<usize>,
    /// Labels containing this text (any case) are cars
    pub car_label: String,
    pub match_policy: MatchPolicy,
    pub report: TraceReport,
    /// Draw detection labels next to their boxes
    pub draw_labels: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        let tracker = TrackerConfig::default();
        Self {
            zone: ZoneSpec::default(),
            tolerance: tracker.tolerance,
            min_trace_length: tracker.min_trace_length,
            workers: None,
            car_label: "car".to_string(),
            match_policy: tracker.match_policy,
            report: tracker.report,
            draw_labels: false,
        }
    }
}

impl ProcessorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        self.zone.validate()?;
        self.tracker_config().validate()?;
        if self.workers == Some(0) {
            return Err(Error::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            tolerance: self.tolerance,
            min_trace_length: self.min_trace_length,
            match_policy: self.match_policy,
            report: self.report,
        }
    }

    pub fn label_filter(&self) -> LabelFilter {
        LabelFilter::substring(self.car_label.as_str())
    }

    /// Resolved worker count, never zero.
    pub fn worker_count(&self) -> usize {
        match self.workers {
            Some(n) => n.max(1),
            None => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProcessorConfig::default();
        assert_eq!(config.zone, ZoneSpec::FullFrame { top_margin: 125 });
        assert_eq!(config.tolerance, 10.0);
        assert!(config.validate().is_ok());
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_partial_json() {
        let config = ProcessorConfig::from_json_str(
            r#"{"zone":{"kind":"anchored","x":0,"y":125},"tolerance":12.5,"workers":3,"match_policy":"shared"}"#,
        )
        .unwrap();
        assert_eq!(config.zone, ZoneSpec::Anchored { x: 0, y: 125 });
        assert_eq!(config.tolerance, 12.5);
        assert_eq!(config.worker_count(), 3);
        assert_eq!(config.match_policy, MatchPolicy::Shared);
        assert_eq!(config.min_trace_length, 2);
    }

    #[test]
    fn test_invalid_values() {
        for json in [
            r#"{"tolerance":0}"#,
            r#"{"tolerance":-2.5}"#,
            r#"{"min_trace_length":0}"#,
            r#"{"workers":0}"#,
            r#"{"zone":{"kind":"explicit","x":0,"y":0,"width":-1,"height":5}}"#,
            r#"{"zone":{"kind":"full_frame","top_margin":-1}}"#,
        ] {
            let result = ProcessorConfig::from_json_str(json);
            assert!(
                matches!(result, Err(Error::InvalidConfig(_))),
                "{json} should be rejected"
            );
        }
    }

    #[test]
    fn test_unknown_field_is_a_parse_error() {
        let result = ProcessorConfig::from_json_str(r#"{"tolerence": 5}"#);
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
