//! Metric Aggregator
//!
//! Folds raw engagement samples and interaction records into per-item
//! `ContentMetrics` for a time range. Read-only; works on data the caller
//! has already fetched.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;
use uuid::Uuid;

use crate::engagement::non_negative;
use crate::models::{
    clamp_percent, ratio_percent, ContentItem, ContentMetrics, EngagementSample,
    InteractionCounts, InteractionKind, InteractionRecord, TimeRange, TrafficSource,
};

/// Means and flags over the samples of one item inside a range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSummary {
    pub count: u64,
    pub avg_time_on_page: f64,
    pub avg_scroll_depth: f64,
    pub avg_completion_rate: f64,
    pub bounced: u64,
    pub engaged: u64,
    pub sources: BTreeMap<TrafficSource, u64>,
}

/// Summarize samples recorded inside `range`.
///
/// With no samples in range every average is 0.
pub fn aggregate_samples<'a, I>(samples: I, range: TimeRange) -> SampleSummary
where
    I: IntoIterator<Item = &'a EngagementSample>,
{
    let mut summary = SampleSummary::default();
    let mut total_time = 0.0;
    let mut total_scroll = 0.0;
    let mut total_completion = 0.0;

    for sample in samples.into_iter().filter(|s| range.contains(s.recorded_at)) {
        summary.count += 1;
        total_time += non_negative(sample.time_on_page_seconds);
        total_scroll += clamp_percent(sample.scroll_depth_percent);
        total_completion += clamp_percent(sample.completion_rate);

        if sample.bounced() {
            summary.bounced += 1;
        }
        if sample.engaged_session {
            summary.engaged += 1;
        }
        *summary.sources.entry(sample.source).or_insert(0) += 1;
    }

    if summary.count > 0 {
        let n = summary.count as f64;
        summary.avg_time_on_page = total_time / n;
        summary.avg_scroll_depth = total_scroll / n;
        summary.avg_completion_rate = total_completion / n;
    }

    summary
}

/// Tally interaction records created inside `range`.
///
/// Returns the interaction counts and the number of conversions.
pub fn count_interactions<'a, I>(records: I, range: TimeRange) -> (InteractionCounts, u64)
where
    I: IntoIterator<Item = &'a InteractionRecord>,
{
    let mut counts = InteractionCounts::default();
    let mut conversions = 0;

    for record in records.into_iter().filter(|r| range.contains(r.created_at)) {
        match record.kind {
            InteractionKind::Conversion => conversions += 1,
            kind => counts.increment(kind),
        }
    }

    (counts, conversions)
}

fn build_metrics(
    content_id: Uuid,
    summary: SampleSummary,
    counts: InteractionCounts,
    conversions: u64,
) -> ContentMetrics {
    ContentMetrics {
        content_id,
        sample_count: summary.count,
        avg_time_on_page: summary.avg_time_on_page,
        avg_scroll_depth: summary.avg_scroll_depth,
        avg_completion_rate: summary.avg_completion_rate,
        bounce_rate: ratio_percent(summary.bounced, summary.count),
        engaged_session_rate: ratio_percent(summary.engaged, summary.count),
        interactions: counts,
        conversions,
        sources: summary.sources,
    }
}

/// Build the metric bundle for a single item.
///
/// Rows belonging to other items are ignored, so callers may pass a shared
/// slice.
pub fn aggregate_content(
    content_id: Uuid,
    samples: &[EngagementSample],
    records: &[InteractionRecord],
    range: TimeRange,
) -> ContentMetrics {
    let summary = aggregate_samples(samples.iter().filter(|s| s.content_id == content_id), range);
    let (counts, conversions) =
        count_interactions(records.iter().filter(|r| r.content_id == content_id), range);

    build_metrics(content_id, summary, counts, conversions)
}

/// Build one metric bundle per item, in the order of `items`.
///
/// Items without any samples or records get all-zero metrics; nothing is
/// dropped.
pub fn aggregate_batch(
    items: &[ContentItem],
    samples: &[EngagementSample],
    records: &[InteractionRecord],
    range: TimeRange,
) -> Vec<ContentMetrics> {
    let mut samples_by_item: HashMap<Uuid, Vec<&EngagementSample>> = HashMap::new();
    for sample in samples {
        samples_by_item
            .entry(sample.content_id)
            .or_default()
            .push(sample);
    }

    let mut records_by_item: HashMap<Uuid, Vec<&InteractionRecord>> = HashMap::new();
    for record in records {
        records_by_item
            .entry(record.content_id)
            .or_default()
            .push(record);
    }

    let metrics: Vec<ContentMetrics> = items
        .iter()
        .map(|item| {
            let summary = samples_by_item
                .get(&item.id)
                .map(|rows| aggregate_samples(rows.iter().copied(), range))
                .unwrap_or_default();
            let (counts, conversions) = records_by_item
                .get(&item.id)
                .map(|rows| count_interactions(rows.iter().copied(), range))
                .unwrap_or_default();

            build_metrics(item.id, summary, counts, conversions)
        })
        .collect();

    debug!(
        items = items.len(),
        samples = samples.len(),
        records = records.len(),
        "Aggregated batch metrics"
    );

    metrics
}
