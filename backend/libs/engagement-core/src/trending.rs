//! Trending Score Calculator
//!
//! Hacker-News style gravity decay over weighted engagement:
//!
//! ```text
//! raw   = views * w_views + likes * w_likes + comments * w_comments + favorites * w_favorites
//! score = (raw + baseline) / (age_hours + offset_hours) ^ gravity
//! ```
//!
//! `offset_hours > 0` keeps the divisor positive for brand-new items and
//! `baseline > 0` keeps zero-engagement items ordered by age.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engagement::non_negative;
use crate::error::{Result, ScoringError};
use crate::models::{ContentItem, InteractionCounts};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Default trailing window for the trending candidate pool
pub const DEFAULT_TRENDING_WINDOW_DAYS: i64 = 7;

/// Raw counts and creation time of one candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendingInput {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub favorites: u64,
    pub created_at: DateTime<Utc>,
}

impl TrendingInput {
    pub fn from_counts(counts: &InteractionCounts, created_at: DateTime<Utc>) -> Self {
        Self {
            views: counts.views,
            likes: counts.likes,
            comments: counts.comments,
            favorites: counts.favorites,
            created_at,
        }
    }
}

/// Tunable decay parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendingWeights {
    pub views: f64,
    pub likes: f64,
    pub comments: f64,
    pub favorites: f64,
    pub baseline: f64,
    pub offset_hours: f64,
    pub gravity: f64,
}

impl Default for TrendingWeights {
    fn default() -> Self {
        Self {
            views: 1.0,
            likes: 3.0,
            comments: 5.0,
            favorites: 5.0,
            baseline: 1.0,
            offset_hours: 2.0,
            gravity: 1.5,
        }
    }
}

impl TrendingWeights {
    /// Active engagement must outweigh passive consumption, and the decay
    /// must be strictly decreasing and defined at age zero.
    pub fn validate(&self) -> Result<()> {
        let all = [
            ("views", self.views),
            ("likes", self.likes),
            ("comments", self.comments),
            ("favorites", self.favorites),
            ("baseline", self.baseline),
            ("offset_hours", self.offset_hours),
            ("gravity", self.gravity),
        ];
        if let Some((name, value)) = all.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(ScoringError::InvalidWeights(format!(
                "trending parameter '{}' must be a finite non-negative number, got {}",
                name, value
            )));
        }

        if !(self.views < self.likes && self.likes < self.comments.min(self.favorites)) {
            return Err(ScoringError::InvalidWeights(format!(
                "trending weights must satisfy views < likes < comments/favorites, got {} / {} / {} / {}",
                self.views, self.likes, self.comments, self.favorites
            )));
        }

        if self.gravity <= 1.0 {
            return Err(ScoringError::InvalidWeights(format!(
                "gravity must be greater than 1, got {}",
                self.gravity
            )));
        }

        if self.offset_hours <= 0.0 || self.baseline <= 0.0 {
            return Err(ScoringError::InvalidWeights(
                "offset_hours and baseline must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Age in fractional hours, never negative.
pub fn age_hours(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - created_at).num_milliseconds().max(0) as f64;
    millis / MILLIS_PER_HOUR
}

/// Compute the trending score of one item at `now`.
///
/// Always finite and non-negative for validated weights.
pub fn trending_score(input: &TrendingInput, weights: &TrendingWeights, now: DateTime<Utc>) -> f64 {
    let raw = input.views as f64 * weights.views
        + input.likes as f64 * weights.likes
        + input.comments as f64 * weights.comments
        + input.favorites as f64 * weights.favorites;

    let age = age_hours(input.created_at, now);
    let decay = (age + weights.offset_hours).powf(weights.gravity);
    if decay <= 0.0 || !decay.is_finite() {
        return 0.0;
    }

    non_negative((raw + weights.baseline) / decay)
}

/// Start of the trailing window `now - window_days`.
///
/// `None` when the window reaches past the representable date range.
pub fn window_start(now: DateTime<Utc>, window_days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(window_days.max(0)).and_then(|span| now.checked_sub_signed(span))
}

/// Keep only items created within `[now - window_days, now]`.
///
/// Items outside the window are excluded rather than scored near zero.
pub fn select_candidates(
    items: &[ContentItem],
    now: DateTime<Utc>,
    window_days: i64,
) -> Vec<ContentItem> {
    let cutoff = window_start(now, window_days).unwrap_or(DateTime::<Utc>::MIN_UTC);

    let selected: Vec<ContentItem> = items
        .iter()
        .filter(|item| item.created_at >= cutoff && item.created_at <= now)
        .cloned()
        .collect();

    debug!(
        total = items.len(),
        selected = selected.len(),
        window_days,
        "Selected trending candidates"
    );

    selected
}
