/// Lifecycle of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceState {
    /// Matched in the most recently processed frame, eligible to match again
    #[default]
    Active,
    /// Missed a frame; history is frozen and kept for counting
    Inactive,
}
