pub mod config;
pub mod db;
pub mod error;
pub mod services;

pub use config::Config;
pub use db::{ActivityRepository, ActivitySnapshot, InMemoryActivityRepo};
pub use error::{AppError, Result};
pub use services::{AnalyticsService, ContentPerformance, TrendingReport};
