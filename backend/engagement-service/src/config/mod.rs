use engagement_core::trending::DEFAULT_TRENDING_WINDOW_DAYS;
use engagement_core::{EngagementWeights, RankMetric, TimeWindow, TrendingWeights};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Upper bound on items scored per ranking call
pub const DEFAULT_MAX_CANDIDATES: usize = 100;

/// Longest accepted trailing window for the trending pool (ten years)
pub const MAX_TRENDING_WINDOW_DAYS: i64 = 3650;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub report: ReportConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub service_name: String,
    pub snapshot_path: PathBuf,
}

/// What the batch report job prints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub tenant_id: Option<Uuid>,
    pub limit: usize,
    pub metric: RankMetric,
    pub window: TimeWindow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub engagement: EngagementWeights,
    pub trending: TrendingWeights,
    pub trending_window_days: i64,
    pub max_candidates: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            engagement: EngagementWeights::default(),
            trending: TrendingWeights::default(),
            trending_window_days: DEFAULT_TRENDING_WINDOW_DAYS,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        self.engagement.validate()?;
        self.trending.validate()?;

        if self.trending_window_days <= 0 || self.trending_window_days > MAX_TRENDING_WINDOW_DAYS {
            return Err(AppError::Config(format!(
                "TRENDING_WINDOW_DAYS must be between 1 and {}, got {}",
                MAX_TRENDING_WINDOW_DAYS, self.trending_window_days
            )));
        }
        if self.max_candidates == 0 {
            return Err(AppError::Config(
                "TRENDING_MAX_CANDIDATES must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let scoring = ScoringConfig {
            engagement: envy::prefixed("ENGAGEMENT_").from_env::<EngagementWeights>()?,
            trending: envy::prefixed("TRENDING_WEIGHT_").from_env::<TrendingWeights>()?,
            trending_window_days: env_or("TRENDING_WINDOW_DAYS", DEFAULT_TRENDING_WINDOW_DAYS)?,
            max_candidates: env_or("TRENDING_MAX_CANDIDATES", DEFAULT_MAX_CANDIDATES)?,
        };
        scoring.validate()?;

        let tenant_id = match env::var("REPORT_TENANT_ID") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_var("REPORT_TENANT_ID", &raw)?),
            _ => None,
        };

        let limit: usize = env_or("REPORT_LIMIT", 10)?;
        if limit == 0 {
            return Err(AppError::Config("REPORT_LIMIT must be positive".to_string()));
        }

        Ok(Config {
            service: ServiceConfig {
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "engagement-service".to_string()),
                snapshot_path: env::var("SNAPSHOT_PATH")
                    .unwrap_or_else(|_| "./data/activity_snapshot.json".to_string())
                    .into(),
            },
            report: ReportConfig {
                tenant_id,
                limit,
                metric: env_or("REPORT_METRIC", RankMetric::Engagement)?,
                window: env_or("REPORT_WINDOW", TimeWindow::Week)?,
            },
            scoring,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => parse_var(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| AppError::Config(format!("{} is invalid ({}): {}", key, raw, e)))
}
