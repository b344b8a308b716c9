//! Transformation of activity logs into time, user and songplay rows.

mod batch;
mod time;

pub use batch::{
    load_activity_batch, ActivityBatch, ActivitySummary, PlayEvent, ResolvedActivity,
};
pub use time::start_time_from_millis;
