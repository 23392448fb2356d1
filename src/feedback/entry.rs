use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the user did with a suggested match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackAction {
    Confirmed,
    Rejected,
    Ignored,
}

impl FeedbackAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackAction::Confirmed => "confirmed",
            FeedbackAction::Rejected => "rejected",
            FeedbackAction::Ignored => "ignored",
        }
    }
}

impl std::fmt::Display for FeedbackAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FeedbackAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "confirmed" | "confirm" => Ok(Self::Confirmed),
            "rejected" | "reject" => Ok(Self::Rejected),
            "ignored" | "ignore" => Ok(Self::Ignored),
            other => Err(format!("unknown feedback action: {other}")),
        }
    }
}

/// One user reaction to a scored pair. Written once, never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub pair_id: String,
    pub user_id: String,
    /// Ground truth supplied with the feedback.
    pub is_match: bool,
    /// Score the engine showed the user.
    pub prediction_score: f64,
    pub user_action: FeedbackAction,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl FeedbackEntry {
    pub fn new(
        pair_id: impl Into<String>,
        user_id: impl Into<String>,
        is_match: bool,
        prediction_score: f64,
        user_action: FeedbackAction,
    ) -> Self {
        Self {
            pair_id: pair_id.into(),
            user_id: user_id.into(),
            is_match,
            prediction_score,
            user_action,
            timestamp: Utc::now(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Ignored entries carry no label.
    pub fn is_labeling(&self) -> bool {
        self.user_action != FeedbackAction::Ignored
    }
}
