//! Tracker service models

pub mod event;
pub mod record;
pub mod screenshot;
pub mod segment;

// Re-export for convenience
pub use event::{TimerEvent, TimerEventType};
pub use record::DailyRecord;
pub use screenshot::Screenshot;
pub use segment::{SegmentStatus, TimeSegment};
