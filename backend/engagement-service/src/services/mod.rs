//! Service layer for engagement-service
//!
//! - analytics: per-item performance, top content and trending reports

pub mod analytics;

pub use analytics::{AnalyticsService, ContentPerformance, TrendingReport};
