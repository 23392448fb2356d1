//! User feedback: the append-only log, label propagation into the
//! [`MatchingStore`](crate::features::MatchingStore), online metrics and the
//! retraining trigger.

pub mod entry;
pub mod error;
pub mod log;
pub mod manager;


pub use entry::{FeedbackAction, FeedbackEntry};
pub use error::{FeedbackError, FeedbackResult};
pub use log::FeedbackLog;
pub use manager::{CommitReport, FeedbackManager, FeedbackStats, RuntimeMetrics};
