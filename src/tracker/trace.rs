//! Trace: the detection history of one tracked identity.

use nalgebra::Point2;

use crate::tracker::detection::Detection;
use crate::tracker::trace_state::TraceState;

/// Identity assigned to a trace. Never reused within a tracker.
pub type TraceId = u64;

/// Ordered detections belonging to one persistent identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    id: TraceId,
    state: TraceState,
    /// Frame number (1-based) the trace was created in
    start_frame: u32,
    /// Frame number of the most recent detection
    frame_id: u32,
    detections: Vec<Detection>,
}

impl Trace {
    /// Start a new trace from its first detection.
    pub(crate) fn new(id: TraceId, first: Detection, frame_id: u32) -> Self {
        Self {
            id,
            state: TraceState::Active,
            start_frame: frame_id,
            frame_id,
            detections: vec![first],
        }
    }

    pub(crate) fn push(&mut self, detection: Detection, frame_id: u32) {
        debug_assert_eq!(self.state, TraceState::Active);
        self.detections.push(detection);
        self.frame_id = frame_id;
    }

    pub(crate) fn mark_inactive(&mut self) {
        self.state = TraceState::Inactive;
    }

    pub fn id(&self) -> TraceId {
        self.id
    }

    pub fn state(&self) -> TraceState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TraceState::Active
    }

    pub fn start_frame(&self) -> u32 {
        self.start_frame
    }

    pub fn end_frame(&self) -> u32 {
        self.frame_id
    }

    /// Number of detections recorded.
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    /// Always false; a trace is created with its first detection.
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Whether the trace is long enough to be counted.
    pub fn has_reached(&self, min_length: usize) -> bool {
        self.len() >= min_length
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    /// The most recent detection, the match candidate for the next frame.
    pub fn last(&self) -> &Detection {
        // A trace always holds at least the detection it was created from.
        &self.detections[self.detections.len() - 1]
    }

    /// Center history, oldest first.
    pub fn centers(&self) -> impl Iterator<Item = Point2<f64>> + '_ {
        self.detections.iter().map(Detection::center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_lifecycle() {
        let mut trace = Trace::new(3, Detection::new(0, 0, 10, 10, "car"), 1);
        assert_eq!(trace.id(), 3);
        assert!(trace.is_active());
        assert_eq!(trace.len(), 1);
        assert!(!trace.has_reached(2));

        trace.push(Detection::new(2, 2, 10, 10, "car"), 2);
        assert!(trace.has_reached(2));
        assert_eq!(trace.last().bbox.x, 2);
        assert_eq!((trace.start_frame(), trace.end_frame()), (1, 2));

        trace.mark_inactive();
        assert_eq!(trace.state(), TraceState::Inactive);

        let centers: Vec<_> = trace.centers().collect();
        assert_eq!(centers, vec![Point2::new(5.0, 5.0), Point2::new(7.0, 7.0)]);
    }
}
