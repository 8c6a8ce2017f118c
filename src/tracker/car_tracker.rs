//! Greedy nearest-center tracker that turns per-frame detections into traces
//! and counts the traces that lived long enough to be cars.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::tracker::detection::Detection;
use crate::tracker::matching::{self, AssignmentResult, MatchPolicy};
use crate::tracker::rect::Rect;
use crate::tracker::trace::{Trace, TraceId};

/// Which traces `CarTracker::track` hands back after each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceReport {
    /// Traces matched in the frame just processed.
    #[default]
    Active,
    /// Every trace created so far, active or not.
    All,
}

/// Configuration for the CarTracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Maximum center-to-center distance for a detection to continue a trace
    pub tolerance: f64,
    /// Trace length at which an identity counts as a car
    pub min_trace_length: usize,
    pub match_policy: MatchPolicy,
    pub report: TraceReport,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tolerance: 10.0,
            min_trace_length: 2,
            match_policy: MatchPolicy::default(),
            report: TraceReport::default(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        if self.min_trace_length == 0 {
            return Err(Error::InvalidConfig(
                "min_trace_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Assigns persistent identities to detections across frames.
///
/// `track` must be called once per frame, in temporal order. Only the traces
/// matched in the previous frame are candidates for the next one; a trace
/// that misses a frame is frozen but kept, so the car count never drops.
#[derive(Debug)]
pub struct CarTracker {
    config: TrackerConfig,
    next_id: TraceId,
    frame_id: u32,
    traces: BTreeMap<TraceId, Trace>,
    /// Identities matched in the last frame, ascending
    active_ids: Vec<TraceId>,
    car_counter: usize,
}

impl CarTracker {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            next_id: 1,
            frame_id: 0,
            traces: BTreeMap::new(),
            active_ids: Vec::new(),
            car_counter: 0,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Process one frame of already filtered detections.
    pub fn track(&mut self, detections: Vec<Detection>) -> Vec<&Trace> {
        self.frame_id += 1;
        let frame_id = self.frame_id;

        // Step 1: candidates are the last detections of the active traces
        let candidate_rects: Vec<Rect> = self
            .active_ids
            .iter()
            .filter_map(|id| self.traces.get(id))
            .map(|t| t.last().bbox)
            .collect();
        let det_rects: Vec<Rect> = detections.iter().map(|d| d.bbox).collect();

        // Step 2: match within tolerance
        let dists = matching::center_distance(&candidate_rects, &det_rects);
        let AssignmentResult {
            matches,
            unmatched_detections,
        } = matching::greedy_assignment(&dists, self.config.tolerance, self.config.match_policy);

        let mut detections: Vec<Option<Detection>> = detections.into_iter().map(Some).collect();
        let mut matched_ids = BTreeSet::new();

        // Step 3: extend matched traces
        for (row, col) in matches {
            let id = self.active_ids[row];
            if let Some(det) = detections[col].take() {
                self.extend(id, det, frame_id);
                matched_ids.insert(id);
            }
        }

        // Step 4: unmatched detections start new traces
        for col in unmatched_detections {
            if let Some(det) = detections[col].take() {
                let id = self.mint(det, frame_id);
                matched_ids.insert(id);
            }
        }

        // Step 5: previous identities without a match go inactive
        for id in &self.active_ids {
            if !matched_ids.contains(id) {
                if let Some(t) = self.traces.get_mut(id) {
                    t.mark_inactive();
                    trace!(id, len = t.len(), "trace went inactive");
                }
            }
        }
        self.active_ids = matched_ids.into_iter().collect();

        self.reported_traces()
    }

    /// The traces `track` returned for the last frame, per `TraceReport`.
    pub fn reported_traces(&self) -> Vec<&Trace> {
        match self.config.report {
            TraceReport::Active => self.active_traces().collect(),
            TraceReport::All => self.traces.values().collect(),
        }
    }

    fn extend(&mut self, id: TraceId, detection: Detection, frame_id: u32) {
        let min_len = self.config.min_trace_length;
        if let Some(t) = self.traces.get_mut(&id) {
            t.push(detection, frame_id);
            if t.len() == min_len {
                self.car_counter += 1;
                debug!(id, count = self.car_counter, "trace reached counting length");
            }
        }
    }

    fn mint(&mut self, detection: Detection, frame_id: u32) -> TraceId {
        let id = self.next_id;
        self.next_id += 1;
        debug!(id, frame = frame_id, "new trace");
        let t = Trace::new(id, detection, frame_id);
        if t.has_reached(self.config.min_trace_length) {
            self.car_counter += 1;
        }
        self.traces.insert(id, t);
        id
    }

    /// Number of traces whose length has reached `min_trace_length`.
    pub fn car_counter(&self) -> usize {
        self.car_counter
    }

    /// Number of frames processed so far.
    pub fn frame_count(&self) -> u32 {
        self.frame_id
    }

    pub fn active_ids(&self) -> &[TraceId] {
        &self.active_ids
    }

    pub fn active_traces(&self) -> impl Iterator<Item = &Trace> + '_ {
        self.active_ids.iter().filter_map(|id| self.traces.get(id))
    }

    /// Every trace ever created, ascending by identity.
    pub fn traces(&self) -> impl Iterator<Item = &Trace> + '_ {
        self.traces.values()
    }

    pub fn trace(&self, id: TraceId) -> Option<&Trace> {
        self.traces.get(&id)
    }
}
