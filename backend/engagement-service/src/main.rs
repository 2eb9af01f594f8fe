use anyhow::Context;
use engagement_service::{AnalyticsService, Config, InMemoryActivityRepo};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("Failed to load config")?;

    info!(
        "Starting {} report job (snapshot: {})",
        config.service.service_name,
        config.service.snapshot_path.display()
    );

    let repo = InMemoryActivityRepo::from_snapshot_file(&config.service.snapshot_path)
        .await
        .context("Failed to load activity snapshot")?;
    let service = AnalyticsService::new(Arc::new(repo), config.scoring.clone());

    // One instant for the whole report
    let now = chrono::Utc::now();

    let trending = service
        .trending(config.report.tenant_id, config.report.limit, now)
        .await?;

    let top_content = match config.report.tenant_id {
        Some(tenant_id) => Some(
            service
                .top_content(
                    tenant_id,
                    config.report.metric,
                    config.report.window,
                    config.report.limit,
                    now,
                )
                .await?,
        ),
        None => None,
    };

    let report = json!({
        "generated_at": now,
        "trending": trending,
        "top_content": top_content.map(|items| json!({
            "metric": config.report.metric,
            "window": config.report.window,
            "items": items,
        })),
    });

    println!("{}", serde_json::to_string_pretty(&report)?);

    info!(trending = trending.count, "Report complete");

    Ok(())
}
