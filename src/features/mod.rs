//! Feature extraction and the labeled-pair store.
//!
//! [`FeatureExtractor`] turns a text pair into the fixed [`MatchingFeatures`] vector.
//! [`MatchingStore`] is the append-only JSONL repository of [`MatchingRecord`]s that
//! feedback labels and the trainer reads.

pub mod error;
pub mod extractor;
pub mod record;
pub mod store;


pub use error::{StoreError, StoreResult};
pub use extractor::{
    FeatureExtractor, SynonymDictionary, category_pair_feature, extended_feature_map,
    length_diff, semantic_features, synonym_ratio, word_overlap,
};
pub use record::{MatchingFeatures, MatchingRecord};
pub use store::{LabeledData, MatchingStore, StoreStatistics};
