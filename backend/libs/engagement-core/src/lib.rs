//! Engagement and trending scoring engine
//!
//! Pure, synchronous scoring over already-materialized activity data:
//! - `aggregator`: per-item sample means, interaction tallies and rates
//! - `engagement`: weighted 0-100 engagement score
//! - `trending`: age-decayed popularity score and candidate window
//! - `ranker`: deterministic top-N ordering by a selected metric
//!
//! Nothing in this crate reads the wall clock. Every operation that depends
//! on time takes `now` from the caller so one ranking pass sees one instant.

pub mod aggregator;
pub mod engagement;
pub mod error;
pub mod models;
pub mod ranker;
pub mod trending;

pub use aggregator::{
    aggregate_batch, aggregate_content, aggregate_samples, count_interactions, SampleSummary,
};
pub use engagement::{engagement_score, EngagementInput, EngagementWeights};
pub use error::{Result, ScoringError};
pub use models::{
    ContentItem, ContentMetrics, EngagementSample, InteractionCounts, InteractionKind,
    InteractionRecord, ScoreResult, TimeRange, TimeWindow, TrafficSource,
};
pub use ranker::{rank, RankMetric, RankingCandidate, RankingMetrics};
pub use trending::{
    select_candidates, trending_score, window_start, TrendingInput, TrendingWeights,
};
