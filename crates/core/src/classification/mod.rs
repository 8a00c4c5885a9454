//! Title-based classification of imported events

pub mod classifier;

pub use classifier::{classify_title, EventClassifier, KeywordRule, DEFAULT_RULES};
