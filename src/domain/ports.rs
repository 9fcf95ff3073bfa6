use crate::domain::model::{
    BasicResult, DailyFortune, DirectionAdvice, HealthStatus, InterpretiveResult, Query,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn request_timeout(&self) -> Duration;
}

/// Typed access to the remote analysis service. One attempt per call, no caching.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn health_check(&self) -> Result<HealthStatus>;

    async fn request_basic(&self, query: &Query) -> Result<BasicResult>;

    async fn request_interpretation(
        &self,
        query: &Query,
        basic: &BasicResult,
    ) -> Result<InterpretiveResult>;

    async fn request_direction_advice(&self, direction: &str) -> Result<DirectionAdvice>;

    async fn request_daily_fortune(
        &self,
        date: Option<NaiveDate>,
        basic: Option<&BasicResult>,
    ) -> Result<DailyFortune>;
}
