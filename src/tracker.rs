mod car_tracker;
mod detection;
mod matching;
mod rect;
mod trace;
mod trace_state;
mod zone;

pub use car_tracker::{CarTracker, TraceReport, TrackerConfig};
pub use detection::{Detection, LabelFilter};
pub use matching::{AssignmentResult, MatchPolicy, center_distance, greedy_assignment};
pub use rect::Rect;
pub use trace::{Trace, TraceId};
pub use trace_state::TraceState;
pub use zone::{ActionZone, DEFAULT_TOP_MARGIN, ZoneSpec};
