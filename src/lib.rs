//! iMessage Wrapped - year-in-review statistics for message histories
//!
//! A Rust library that turns an exported year of conversations into a
//! statistics document: volume, timing, contacts, content, phrases,
//! sentiment, response times, tapbacks, streaks and ghosting.
//!
//! # Features
//!
//! - Pluggable conversation filters applied before any statistics
//! - N-gram phrase mining with overlap de-duplication
//! - Lexical sentiment scoring, with an optional neural backend
//!   (`advanced-nlp` feature) and deterministic subsampling
//! - Ghosting detection over a configurable silence window

/// Statistics orchestrator and per-section computations
pub mod analyzer;
/// Configuration management
pub mod config;
/// Error types
pub mod error;
/// Conversation filters
pub mod filters;
/// Ghosting detection
pub mod ghost;
/// Export loading
pub mod loader;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Phrase extraction
pub mod phrases;
/// Phrase scoring
pub mod scoring;
/// Sentiment analysis backends and sampling
pub mod sentiment;
/// Stopword providers
pub mod stopwords;
/// Phrase tokenization
pub mod tokenizer;
/// Numeric and formatting helpers
pub mod utils;
/// Input validation and sanitization
pub mod validation;
/// Statistics output
pub mod writer;

// Re-export key components for easier access
pub use analyzer::{StatisticsAnalyzer, WrappedStatistics};
pub use error::{Result, WrappedError};
pub use models::{Conversation, ExportData, Message, Tapback, TapbackKind};
pub use phrases::{PhraseExtractionConfig, PhraseExtractor};
pub use sentiment::{SentimentAnalyzer, SentimentEngine};
