/// Analytics Service
///
/// Fetches materialized activity from the repository and drives the scoring
/// engine. Every operation takes `now` from the caller; one request is
/// scored against one instant.
use chrono::{DateTime, Utc};
use engagement_core::trending::TrendingInput;
use engagement_core::{
    aggregate_batch, engagement_score, rank, select_candidates, trending_score, window_start,
    ContentItem, ContentMetrics, RankMetric, RankingCandidate, RankingMetrics, ScoreResult,
    TimeRange, TimeWindow,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ScoringConfig;
use crate::db::ActivityRepository;
use crate::error::{AppError, Result};

/// Scored metrics of one item over one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPerformance {
    pub content_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub window: TimeWindow,
    pub metrics: ContentMetrics,
    pub engagement_score: u32,
    /// Always computed from all-time counts, whatever `window` is
    pub trending_score: f64,
}

impl ContentPerformance {
    fn ranking_candidate(&self) -> RankingCandidate {
        RankingCandidate {
            content_id: self.content_id,
            created_at: self.created_at,
            metrics: RankingMetrics {
                views: self.metrics.interactions.views,
                engagement: self.engagement_score,
                conversions: self.metrics.conversions,
                trending: self.trending_score,
            },
        }
    }
}

/// Trending response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingReport {
    pub items: Vec<ScoreResult>,
    pub count: usize,
    pub tenant_id: Option<Uuid>,
    pub window_days: i64,
    pub computed_at: DateTime<Utc>,
}

pub struct AnalyticsService<R: ActivityRepository> {
    repo: Arc<R>,
    scoring: ScoringConfig,
}

impl<R: ActivityRepository> AnalyticsService<R> {
    pub fn new(repo: Arc<R>, scoring: ScoringConfig) -> Self {
        Self { repo, scoring }
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// Metrics and scores for a single item
    pub async fn content_performance(
        &self,
        content_id: Uuid,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<ContentPerformance> {
        let item = self
            .repo
            .get_content(content_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("content {}", content_id)))?;

        let mut performance = self.score_items(&[item], window, now).await?;
        performance
            .pop()
            .ok_or_else(|| AppError::Repository("empty aggregation result".to_string()))
    }

    /// Metrics and scores for every item of a tenant, newest first
    pub async fn tenant_performance(
        &self,
        tenant_id: Uuid,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<ContentPerformance>> {
        let items = self.repo.list_tenant_content(tenant_id).await?;
        debug!(%tenant_id, items = items.len(), window = %window, "Scoring tenant content");
        self.score_items(&items, window, now).await
    }

    /// Top `limit` items of a tenant by the selected metric.
    ///
    /// `RankMetric::Trending` ranks the trending pool of the tenant and
    /// ignores `window`.
    pub async fn top_content(
        &self,
        tenant_id: Uuid,
        metric: RankMetric,
        window: TimeWindow,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoreResult>> {
        validate_limit(limit)?;

        if metric == RankMetric::Trending {
            debug!(%tenant_id, "Ranking tenant content by trending pool");
            return Ok(self.trending(Some(tenant_id), limit, now).await?.items);
        }

        let performance = self.tenant_performance(tenant_id, window, now).await?;
        let candidates: Vec<RankingCandidate> = performance
            .iter()
            .map(ContentPerformance::ranking_candidate)
            .collect();

        Ok(rank(&candidates, metric, limit))
    }

    /// Recency-weighted popularity over recently created, published items
    pub async fn trending(
        &self,
        tenant_id: Option<Uuid>,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<TrendingReport> {
        validate_limit(limit)?;

        let window_days = self.scoring.trending_window_days;
        let since = window_start(now, window_days).ok_or_else(|| {
            AppError::Config(format!(
                "trending window of {} days is out of range",
                window_days
            ))
        })?;
        let recent = self.repo.list_created_since(tenant_id, since).await?;

        let mut pool: Vec<ContentItem> = select_candidates(&recent, now, window_days)
            .into_iter()
            .filter(|item| item.is_published())
            .collect();

        if pool.len() > self.scoring.max_candidates {
            warn!(
                "Trending pool size {} exceeds limit {}, truncating",
                pool.len(),
                self.scoring.max_candidates
            );
            pool.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
            pool.truncate(self.scoring.max_candidates);
        }

        let metrics = self.load_metrics(&pool, TimeRange::all_time(now)).await?;
        let candidates: Vec<RankingCandidate> = pool
            .iter()
            .zip(metrics.iter())
            .map(|(item, metrics)| {
                let input = TrendingInput::from_counts(&metrics.interactions, item.created_at);
                RankingCandidate {
                    content_id: item.id,
                    created_at: item.created_at,
                    metrics: RankingMetrics {
                        views: metrics.interactions.views,
                        engagement: engagement_score(
                            &metrics.engagement_input(),
                            &self.scoring.engagement,
                        ),
                        conversions: metrics.conversions,
                        trending: trending_score(&input, &self.scoring.trending, now),
                    },
                }
            })
            .collect();

        let items = rank(&candidates, RankMetric::Trending, limit);

        info!(
            tenant_id = ?tenant_id,
            pool = candidates.len(),
            returned = items.len(),
            "Computed trending content"
        );

        Ok(TrendingReport {
            count: items.len(),
            items,
            tenant_id,
            window_days,
            computed_at: now,
        })
    }

    async fn score_items(
        &self,
        items: &[ContentItem],
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<ContentPerformance>> {
        let (metrics, lifetime) = futures::try_join!(
            self.load_metrics(items, window.range(now)),
            self.load_metrics(items, TimeRange::all_time(now))
        )?;

        Ok(items
            .iter()
            .zip(metrics)
            .zip(lifetime.iter())
            .map(|((item, metrics), lifetime)| {
                let engagement =
                    engagement_score(&metrics.engagement_input(), &self.scoring.engagement);
                let input = TrendingInput::from_counts(&lifetime.interactions, item.created_at);
                ContentPerformance {
                    content_id: item.id,
                    created_at: item.created_at,
                    window,
                    engagement_score: engagement,
                    trending_score: trending_score(&input, &self.scoring.trending, now),
                    metrics,
                }
            })
            .collect())
    }

    /// Fetch samples and interactions concurrently, then aggregate per item.
    async fn load_metrics(
        &self,
        items: &[ContentItem],
        range: TimeRange,
    ) -> Result<Vec<ContentMetrics>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();
        let (samples, records) = futures::try_join!(
            self.repo.fetch_samples(&ids, range),
            self.repo.fetch_interactions(&ids, range)
        )?;

        Ok(aggregate_batch(items, &samples, &records, range))
    }
}

fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(AppError::Validation("limit must be positive".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::activity_repo::MockActivityRepository;
    use chrono::{Duration, TimeZone};
    use engagement_core::{EngagementSample, InteractionKind, InteractionRecord, TrafficSource};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 4, 15, 0, 0).unwrap()
    }

    fn item(hours_old: i64, published: bool) -> ContentItem {
        let created_at = now() - Duration::hours(hours_old);
        ContentItem {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            created_at,
            published_at: published.then_some(created_at),
        }
    }

    fn service(repo: MockActivityRepository) -> AnalyticsService<MockActivityRepository> {
        AnalyticsService::new(Arc::new(repo), ScoringConfig::default())
    }

    #[tokio::test]
    async fn test_content_performance_not_found() {
        let mut repo = MockActivityRepository::new();
        repo.expect_get_content().returning(|_| Ok(None));

        let err = service(repo)
            .content_performance(Uuid::new_v4(), TimeWindow::Week, now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_content_performance_scores_fetched_rows() {
        let article = item(10, true);
        let id = article.id;

        let mut repo = MockActivityRepository::new();
        let fetched = article.clone();
        repo.expect_get_content()
            .returning(move |_| Ok(Some(fetched.clone())));
        repo.expect_fetch_samples().returning(move |_, _| {
            Ok(vec![EngagementSample {
                content_id: id,
                time_on_page_seconds: 120.0,
                scroll_depth_percent: 100.0,
                completion_rate: 100.0,
                engaged_session: false,
                source: TrafficSource::Social,
                recorded_at: now() - Duration::hours(1),
            }])
        });
        repo.expect_fetch_interactions().returning(|_, _| Ok(vec![]));

        let performance = service(repo)
            .content_performance(id, TimeWindow::Week, now())
            .await
            .unwrap();
        assert_eq!(performance.engagement_score, 70);
        assert_eq!(performance.metrics.sample_count, 1);
        assert!(performance.trending_score > 0.0);
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected() {
        let svc = service(MockActivityRepository::new());

        let err = svc.trending(None, 0, now()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = svc
            .top_content(Uuid::nil(), RankMetric::Views, TimeWindow::Day, 0, now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_repository_errors_propagate() {
        let mut repo = MockActivityRepository::new();
        repo.expect_list_tenant_content()
            .returning(|_| Err(AppError::Repository("connection reset".to_string())));

        let err = service(repo)
            .tenant_performance(Uuid::nil(), TimeWindow::Day, now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Repository(_)));
    }

    #[tokio::test]
    async fn test_trending_skips_drafts_and_requests_window() {
        let published = item(3, true);
        let draft = item(1, false);
        let published_id = published.id;

        let mut repo = MockActivityRepository::new();
        let listed = vec![draft, published];
        repo.expect_list_created_since()
            .withf(|tenant, since| tenant.is_none() && *since == now() - Duration::days(7))
            .returning(move |_, _| Ok(listed.clone()));
        repo.expect_fetch_samples()
            .withf(move |ids, range| {
                ids.len() == 1 && ids[0] == published_id && range.since.is_none()
            })
            .returning(|_, _| Ok(vec![]));
        repo.expect_fetch_interactions().returning(move |_, _| {
            Ok(vec![InteractionRecord {
                content_id: published_id,
                kind: InteractionKind::Like,
                user_id: None,
                created_at: now() - Duration::hours(2),
            }])
        });

        let report = service(repo).trending(None, 10, now()).await.unwrap();
        assert_eq!(report.count, 1);
        assert_eq!(report.items[0].content_id, published_id);
        assert_eq!(report.computed_at, now());
        assert_eq!(report.window_days, 7);
    }

    #[tokio::test]
    async fn test_trending_rejects_unrepresentable_window() {
        let scoring = ScoringConfig {
            trending_window_days: 200_000_000,
            ..ScoringConfig::default()
        };
        let svc = AnalyticsService::new(Arc::new(MockActivityRepository::new()), scoring);

        let err = svc.trending(None, 10, now()).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_trending_caps_candidate_pool() {
        let items: Vec<ContentItem> = (0..5).map(|h| item(h + 1, true)).collect();

        let mut repo = MockActivityRepository::new();
        let listed = items.clone();
        repo.expect_list_created_since()
            .returning(move |_, _| Ok(listed.clone()));
        repo.expect_fetch_samples()
            .withf(|ids, _| ids.len() == 3)
            .returning(|_, _| Ok(vec![]));
        repo.expect_fetch_interactions()
            .withf(|ids, _| ids.len() == 3)
            .returning(|_, _| Ok(vec![]));

        let scoring = ScoringConfig {
            max_candidates: 3,
            ..ScoringConfig::default()
        };
        let svc = AnalyticsService::new(Arc::new(repo), scoring);

        let report = svc.trending(None, 10, now()).await.unwrap();
        assert_eq!(report.count, 3);
        // Zero engagement everywhere: freshest first
        assert_eq!(report.items[0].content_id, items[0].id);
    }
}
