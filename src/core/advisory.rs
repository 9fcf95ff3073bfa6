use crate::core::fallback::FallbackAdvisoryResolver;
use crate::domain::model::{BasicResult, DailyFortune, Direction, DirectionAdvice};
use crate::domain::ports::AnalysisService;
use chrono::{Local, NaiveDate};
use std::sync::Arc;

/// Direction and daily lookups, outside the session epochs.
///
/// Each call is one remote attempt. A failure of any kind is logged and
/// answered from [`FallbackAdvisoryResolver`], so callers always get a record.
/// The fallback is consulted only after the remote call has failed.
pub struct AdvisoryDesk<S: AnalysisService> {
    service: Arc<S>,
    fallback: FallbackAdvisoryResolver,
}

impl<S: AnalysisService> AdvisoryDesk<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            fallback: FallbackAdvisoryResolver::new(),
        }
    }

    pub async fn direction_advice(&self, direction: &str) -> DirectionAdvice {
        // Send the canonical label when the input names a known direction.
        let label = direction
            .parse::<Direction>()
            .map(|d| d.label().to_string())
            .unwrap_or_else(|_| direction.trim().to_string());

        match self.service.request_direction_advice(&label).await {
            Ok(advice) => advice,
            Err(e) => {
                tracing::warn!(
                    "Direction advice for '{}' unavailable, using local table: {}",
                    label,
                    e
                );
                self.fallback.resolve(&label)
            }
        }
    }

    /// Fortune for `date` (today when `None`), personalised when a chart is given.
    pub async fn daily_fortune(
        &self,
        date: Option<NaiveDate>,
        basic: Option<&BasicResult>,
    ) -> DailyFortune {
        match self.service.request_daily_fortune(date, basic).await {
            Ok(fortune) => fortune,
            Err(e) => {
                tracing::warn!("Daily fortune unavailable, using placeholder: {}", e);
                let date = date.unwrap_or_else(|| Local::now().date_naive());
                self.fallback.daily_placeholder(date)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{HealthStatus, InterpretiveResult, Query};
    use crate::utils::error::{ErrorKind, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fails every call with a preset error and records the directions it was asked for.
    struct Unreachable {
        error: ErrorKind,
        asked: Mutex<Vec<String>>,
    }

    impl Unreachable {
        fn new(error: ErrorKind) -> Arc<Self> {
            Arc::new(Self {
                error,
                asked: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AnalysisService for Unreachable {
        async fn health_check(&self) -> Result<HealthStatus> {
            Err(self.error.clone())
        }

        async fn request_basic(&self, _query: &Query) -> Result<BasicResult> {
            Err(self.error.clone())
        }

        async fn request_interpretation(
            &self,
            _query: &Query,
            _basic: &BasicResult,
        ) -> Result<InterpretiveResult> {
            Err(self.error.clone())
        }

        async fn request_direction_advice(&self, direction: &str) -> Result<DirectionAdvice> {
            self.asked.lock().unwrap().push(direction.to_string());
            Err(self.error.clone())
        }

        async fn request_daily_fortune(
            &self,
            _date: Option<NaiveDate>,
            _basic: Option<&BasicResult>,
        ) -> Result<DailyFortune> {
            Err(self.error.clone())
        }
    }

    #[tokio::test]
    async fn test_fallback_ignores_failure_reason() {
        let errors = [
            ErrorKind::Timeout { after_ms: 90_000 },
            ErrorKind::NetworkUnavailable("refused".into()),
            ErrorKind::ServerRejected("no".into()),
            ErrorKind::MalformedResponse("bad".into()),
        ];

        for error in errors {
            let desk = AdvisoryDesk::new(Unreachable::new(error));
            let advice = desk.direction_advice("北").await;
            assert_eq!(advice.element, "水");
        }
    }

    #[tokio::test]
    async fn test_direction_is_normalised_before_the_call() {
        let service = Unreachable::new(ErrorKind::NetworkUnavailable("down".into()));
        let desk = AdvisoryDesk::new(service.clone());

        desk.direction_advice("north").await;
        desk.direction_advice("西北方").await;
        desk.direction_advice(" 中 ").await;

        assert_eq!(*service.asked.lock().unwrap(), vec!["北", "西北", "中"]);
    }

    #[tokio::test]
    async fn test_daily_failure_yields_placeholder_for_requested_date() {
        let desk = AdvisoryDesk::new(Unreachable::new(ErrorKind::ServerError {
            status: 500,
            message: "boom".into(),
        }));
        let date = NaiveDate::from_ymd_opt(2025, 8, 14).unwrap();

        let fortune = desk.daily_fortune(Some(date), None).await;
        assert!(fortune.placeholder);
        assert_eq!(fortune.date, date);
    }
}
