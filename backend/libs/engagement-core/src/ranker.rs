//! Ranker
//!
//! Orders candidates descending by one metric and keeps the top `limit`.
//! Ties break on `created_at` (newest first), then `content_id` ascending,
//! so identical input always produces identical output.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::ScoringError;
use crate::models::ScoreResult;

/// Metric a ranking pass sorts by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankMetric {
    Views,
    Engagement,
    Conversions,
    Trending,
}

impl RankMetric {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Views => "views",
            Self::Engagement => "engagement",
            Self::Conversions => "conversions",
            Self::Trending => "trending",
        }
    }
}

impl std::fmt::Display for RankMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RankMetric {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "views" => Ok(Self::Views),
            "engagement" => Ok(Self::Engagement),
            "conversions" => Ok(Self::Conversions),
            "trending" => Ok(Self::Trending),
            other => Err(ScoringError::UnknownMetric(other.to_string())),
        }
    }
}

/// Precomputed metric values for one candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingMetrics {
    pub views: u64,
    pub engagement: u32,
    pub conversions: u64,
    pub trending: f64,
}

impl RankingMetrics {
    pub fn value(&self, metric: RankMetric) -> f64 {
        let value = match metric {
            RankMetric::Views => self.views as f64,
            RankMetric::Engagement => f64::from(self.engagement),
            RankMetric::Conversions => self.conversions as f64,
            RankMetric::Trending => self.trending,
        };

        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingCandidate {
    pub content_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub metrics: RankingMetrics,
}

/// Sort `candidates` by `metric` and truncate to `limit`.
///
/// Output length is `min(limit, candidates.len())`.
pub fn rank(candidates: &[RankingCandidate], metric: RankMetric, limit: usize) -> Vec<ScoreResult> {
    let mut scored: Vec<(&RankingCandidate, f64)> = candidates
        .iter()
        .map(|candidate| (candidate, candidate.metrics.value(metric)))
        .collect();

    scored.sort_by(|(a, score_a), (b, score_b)| compare(a, *score_a, b, *score_b));
    scored.truncate(limit);

    debug!(
        metric = %metric,
        candidates = candidates.len(),
        returned = scored.len(),
        "Ranked candidates"
    );

    scored
        .into_iter()
        .map(|(candidate, score)| ScoreResult {
            content_id: candidate.content_id,
            score,
        })
        .collect()
}

fn compare(a: &RankingCandidate, score_a: f64, b: &RankingCandidate, score_b: f64) -> Ordering {
    score_b
        .total_cmp(&score_a)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.content_id.cmp(&b.content_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 14, 8, 0, 0).unwrap()
    }

    fn candidate(n: u128, views: u64, hours_old: i64) -> RankingCandidate {
        RankingCandidate {
            content_id: Uuid::from_u128(n),
            created_at: base_time() - Duration::hours(hours_old),
            metrics: RankingMetrics {
                views,
                engagement: (views % 100) as u32,
                conversions: views / 10,
                trending: views as f64 / (hours_old as f64 + 2.0),
            },
        }
    }

    #[test]
    fn test_sorts_descending_by_metric() {
        let candidates = vec![candidate(1, 10, 1), candidate(2, 300, 1), candidate(3, 50, 1)];

        let ranked = rank(&candidates, RankMetric::Views, 10);
        let ids: Vec<u128> = ranked.iter().map(|r| r.content_id.as_u128()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(ranked[0].score, 300.0);
    }

    #[test]
    fn test_truncates_to_limit() {
        let candidates: Vec<_> = (0..8).map(|i| candidate(i, i as u64, 1)).collect();
        assert_eq!(rank(&candidates, RankMetric::Views, 5).len(), 5);
        assert_eq!(rank(&candidates, RankMetric::Views, 50).len(), 8);
        assert!(rank(&candidates, RankMetric::Views, 0).is_empty());
    }

    #[test]
    fn test_ties_break_by_recency_then_id() {
        let candidates = vec![
            candidate(9, 40, 10),
            candidate(4, 40, 2),
            candidate(7, 40, 2),
        ];

        let ranked = rank(&candidates, RankMetric::Views, 10);
        let ids: Vec<u128> = ranked.iter().map(|r| r.content_id.as_u128()).collect();
        assert_eq!(ids, vec![4, 7, 9]);
    }

    #[test]
    fn test_nan_metric_sorts_as_zero() {
        let mut broken = candidate(1, 0, 1);
        broken.metrics.trending = f64::NAN;
        let healthy = candidate(2, 20, 1);

        let ranked = rank(&[broken, healthy], RankMetric::Trending, 10);
        assert_eq!(ranked[0].content_id, Uuid::from_u128(2));
        assert_eq!(ranked[1].score, 0.0);
    }

    #[test]
    fn test_parse_metric() {
        assert_eq!("Trending".parse::<RankMetric>().unwrap(), RankMetric::Trending);
        assert_eq!("views".parse::<RankMetric>().unwrap(), RankMetric::Views);
        assert!(matches!(
            "revenue".parse::<RankMetric>(),
            Err(ScoringError::UnknownMetric(_))
        ));
    }
}
