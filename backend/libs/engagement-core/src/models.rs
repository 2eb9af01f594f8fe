use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::engagement::EngagementInput;
use crate::error::ScoringError;

/// Sessions shorter than this count as a bounce.
pub const BOUNCE_THRESHOLD_SECS: f64 = 10.0;

/// A publishable unit of content (article) owned by one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl ContentItem {
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }
}

/// Kind of a single entry in the interaction log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    View,
    Like,
    Dislike,
    Comment,
    Favorite,
    /// CTA click, newsletter signup or any other reader conversion
    Conversion,
}

impl InteractionKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::View => "view",
            Self::Like => "like",
            Self::Dislike => "dislike",
            Self::Comment => "comment",
            Self::Favorite => "favorite",
            Self::Conversion => "conversion",
        }
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the interaction log (like, comment, favorite...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub content_id: Uuid,
    pub kind: InteractionKind,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Per-item tally derived from the interaction log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionCounts {
    pub views: u64,
    pub likes: u64,
    pub dislikes: u64,
    pub comments: u64,
    pub favorites: u64,
}

impl InteractionCounts {
    /// Likes, comments and favorites: everything a reader does beyond viewing.
    /// Dislikes are excluded.
    pub fn active_interactions(&self) -> u64 {
        self.likes + self.comments + self.favorites
    }

    pub(crate) fn increment(&mut self, kind: InteractionKind) {
        match kind {
            InteractionKind::View => self.views += 1,
            InteractionKind::Like => self.likes += 1,
            InteractionKind::Dislike => self.dislikes += 1,
            InteractionKind::Comment => self.comments += 1,
            InteractionKind::Favorite => self.favorites += 1,
            InteractionKind::Conversion => {}
        }
    }
}

/// Traffic channel a view session arrived through.
///
/// Deserializes from any caller label through [`TrafficSource::from_label`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum TrafficSource {
    #[default]
    Direct,
    Organic,
    Social,
    Referral,
    Email,
    Other,
}

impl TrafficSource {
    /// Parse a caller-side channel label. Unknown labels map to `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "" | "direct" => Self::Direct,
            "organic" | "search" => Self::Organic,
            "social" => Self::Social,
            "referral" => Self::Referral,
            "email" | "newsletter" => Self::Email,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Direct => "direct",
            Self::Organic => "organic",
            Self::Social => "social",
            Self::Referral => "referral",
            Self::Email => "email",
            Self::Other => "other",
        }
    }
}

impl From<String> for TrafficSource {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

/// A single view session. Created once per page view, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementSample {
    pub content_id: Uuid,
    pub time_on_page_seconds: f64,
    pub scroll_depth_percent: f64,
    pub completion_rate: f64,
    pub engaged_session: bool,
    #[serde(default)]
    pub source: TrafficSource,
    pub recorded_at: DateTime<Utc>,
}

impl EngagementSample {
    /// True iff the session lasted less than ten seconds.
    pub fn bounced(&self) -> bool {
        self.time_on_page_seconds < BOUNCE_THRESHOLD_SECS
    }
}

/// Ranked output row. Recomputed per request, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub content_id: Uuid,
    pub score: f64,
}

/// Closed time interval `[since, until]`. `since = None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub since: Option<DateTime<Utc>>,
    pub until: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            until,
        }
    }

    pub fn all_time(until: DateTime<Utc>) -> Self {
        Self { since: None, until }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.since.map_or(true, |since| at >= since) && at <= self.until
    }
}

/// Reporting window relative to an injected `now`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "all")]
    AllTime,
}

impl TimeWindow {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Day => "24h",
            Self::Week => "7d",
            Self::Month => "30d",
            Self::AllTime => "all",
        }
    }

    pub fn hours(&self) -> Option<i64> {
        match self {
            Self::Day => Some(24),
            Self::Week => Some(168),
            Self::Month => Some(720),
            Self::AllTime => None,
        }
    }

    pub fn range(&self, now: DateTime<Utc>) -> TimeRange {
        match self.hours() {
            Some(hours) => TimeRange::new(now - Duration::hours(hours), now),
            None => TimeRange::all_time(now),
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "24h" | "1d" => Ok(Self::Day),
            "7d" => Ok(Self::Week),
            "30d" => Ok(Self::Month),
            "all" => Ok(Self::AllTime),
            other => Err(ScoringError::UnknownWindow(other.to_string())),
        }
    }
}

/// Fully materialized metric bundle for one content item over one range.
///
/// Every field is required and zero-defaulted, so an item without any
/// recorded activity is still comparable with the rest of a ranked list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentMetrics {
    pub content_id: Uuid,
    pub sample_count: u64,
    pub avg_time_on_page: f64,
    pub avg_scroll_depth: f64,
    pub avg_completion_rate: f64,
    /// Percent of samples that bounced
    pub bounce_rate: f64,
    /// Percent of samples flagged as engaged sessions
    pub engaged_session_rate: f64,
    pub interactions: InteractionCounts,
    pub conversions: u64,
    pub sources: BTreeMap<TrafficSource, u64>,
}

impl ContentMetrics {
    pub fn empty(content_id: Uuid) -> Self {
        Self {
            content_id,
            ..Default::default()
        }
    }

    /// Active interactions per hundred views. Zero views yields 0.
    pub fn interaction_rate(&self) -> f64 {
        ratio_percent(
            self.interactions.active_interactions(),
            self.interactions.views,
        )
    }

    /// Calculator input with every percentage clamped to `[0, 100]`.
    pub fn engagement_input(&self) -> EngagementInput {
        EngagementInput {
            avg_time_on_page: self.avg_time_on_page.max(0.0),
            avg_scroll_depth: clamp_percent(self.avg_scroll_depth),
            completion_rate: clamp_percent(self.avg_completion_rate),
            interaction_rate: self.interaction_rate(),
            engagement_rate: clamp_percent(self.engaged_session_rate),
        }
    }
}

pub(crate) fn ratio_percent(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64 * 100.0
}

pub(crate) fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
