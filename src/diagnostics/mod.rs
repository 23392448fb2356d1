//! Offline diagnostics: rule/semantic divergence, outliers, consistency checks
//! and labeling candidates.

pub mod analyzer;
pub mod consistency;
pub mod divergence;
pub mod error;

#[cfg(test)]
mod tests;

pub use analyzer::{DiagnosticReport, Diagnostics, DiagnosticsConfig};
pub use consistency::{CaseResult, ConsistencyCase, ConsistencyReport, default_cases};
pub use divergence::{DivergenceDistribution, HISTOGRAM_BUCKETS, Outlier};
pub use error::{DiagnosticsError, DiagnosticsResult};
