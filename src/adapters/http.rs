use crate::adapters::envelope::{
    decode_failure, decode_health, decode_success, ensure_valid, AdvicePayload, AdviceRequest,
    AuspiciousPayload, BasicPayload, CompleteRequest, ConsultationPayload, InterpretationPayload,
    InterpretationRequest,
};
use crate::domain::model::{
    ActivityType, AuspiciousDay, BasicResult, ChartAdvice, CombinedAnalysis, CompleteAnalysis,
    DailyFortune, DailyInfo, DirectionAdvice, HealthStatus, InterpretiveResult, Query,
};
use crate::domain::ports::{AnalysisService, ConfigProvider};
use crate::utils::error::{ErrorKind, Result};
use crate::utils::validation::{validate_url, Validate};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

const DATE_FORMAT: &str = "%Y-%m-%d";

/// HTTP client for the analysis service.
///
/// Every call is a single attempt bounded by one fixed deadline. Failures are
/// classified into [`ErrorKind`]; nothing is cached or retried here.
#[derive(Debug, Clone)]
pub struct RemoteAnalysisClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl RemoteAnalysisClient {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::with_settings(config.base_url(), config.request_timeout())
    }

    pub fn with_settings(base_url: &str, timeout: Duration) -> Result<Self> {
        validate_url("base_url", base_url)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ErrorKind::ConfigError {
                field: "http_client".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Liveness as a plain flag; any failure counts as "not connected".
    pub async fn check_connection(&self) -> bool {
        match self.health_check().await {
            Ok(status) => status.is_healthy(),
            Err(e) => {
                tracing::debug!("Connection check failed: {}", e);
                false
            }
        }
    }

    /// Both phases in a single call (`POST /api/bazi/analyze`).
    pub async fn request_legacy_analysis(&self, query: &Query) -> Result<CombinedAnalysis> {
        query.validate()?;
        let combined: CombinedAnalysis = self.post("/api/bazi/analyze", query).await?;
        Ok(CombinedAnalysis {
            basic: ensure_valid(combined.basic)?,
            interpretation: combined.interpretation,
        })
    }

    /// Feng shui consultation built on a finished analysis of `query`.
    pub async fn request_chart_advice(
        &self,
        query: &Query,
        basic: &BasicResult,
        interpretation: &InterpretiveResult,
    ) -> Result<ChartAdvice> {
        query.validate()?;
        let request = AdviceRequest::consultation(query, basic, interpretation);
        let payload: ConsultationPayload = self.post("/api/fengshui/advice", &request).await?;
        ensure_valid(payload.fengshui_advice)
    }

    /// Best days in a date range for an activity. Failures propagate to the caller.
    pub async fn request_auspicious_days(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        activity: ActivityType,
    ) -> Result<Vec<AuspiciousDay>> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(ErrorKind::validation(
                    "end_date",
                    end,
                    format!("End date must not be before {}", start),
                ));
            }
        }

        let mut params = vec![("activity_type", activity.as_str().to_string())];
        if let Some(start) = start {
            params.push(("start_date", start.format(DATE_FORMAT).to_string()));
        }
        if let Some(end) = end {
            params.push(("end_date", end.format(DATE_FORMAT).to_string()));
        }

        let payload: AuspiciousPayload = self.get("/api/daily/auspicious", &params).await?;
        Ok(payload.auspicious_days)
    }

    /// Full report (`POST /api/analyze/complete`).
    pub async fn request_complete_analysis(&self, query: &Query) -> Result<CompleteAnalysis> {
        query.validate()?;
        let CompleteAnalysis {
            basic,
            interpretation,
            daily_info,
            fengshui_advice,
            final_report,
        } = self
            .post("/api/analyze/complete", &CompleteRequest { user_info: query })
            .await?;

        let daily_info = daily_info
            .map(|daily| -> Result<DailyInfo> {
                Ok(DailyInfo {
                    today_fortune: ensure_valid(daily.today_fortune)?,
                    ..daily
                })
            })
            .transpose()?;

        Ok(CompleteAnalysis {
            basic: ensure_valid(basic)?,
            interpretation,
            daily_info,
            fengshui_advice,
            final_report,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!("Making API request: POST {}", url);
        let body = self.execute(self.client.post(&url).json(body)).await?;
        decode_success(&body)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);
        tracing::debug!("Making API request: GET {} {:?}", url, params);
        let body = self.execute(self.client.get(&url).query(params)).await?;
        decode_success(&body)
    }

    /// Sends the request and returns the body of a 2xx response.
    ///
    /// The whole exchange, body included, runs under the deadline; when it
    /// expires the in-flight future is dropped, so no late answer can surface.
    async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>> {
        let started = Instant::now();
        let exchange = async {
            let response = request.send().await.map_err(|e| self.classify(e))?;
            let status = response.status();
            let body = response.bytes().await.map_err(|e| self.classify(e))?;
            tracing::debug!(
                "API response status: {} ({} bytes, {:?})",
                status,
                body.len(),
                started.elapsed()
            );

            if status.is_success() {
                Ok(body.to_vec())
            } else {
                Err(decode_failure(status, &body))
            }
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(self.timeout_error()),
        }
    }

    fn classify(&self, error: reqwest::Error) -> ErrorKind {
        if error.is_timeout() {
            self.timeout_error()
        } else {
            ErrorKind::NetworkUnavailable(error.to_string())
        }
    }

    fn timeout_error(&self) -> ErrorKind {
        ErrorKind::Timeout {
            after_ms: self.timeout.as_millis() as u64,
        }
    }
}

#[async_trait]
impl AnalysisService for RemoteAnalysisClient {
    async fn health_check(&self) -> Result<HealthStatus> {
        let url = self.url("/api/health");
        tracing::debug!("Making API request: GET {}", url);
        let body = self.execute(self.client.get(&url)).await?;
        decode_health(&body)
    }

    async fn request_basic(&self, query: &Query) -> Result<BasicResult> {
        query.validate()?;
        let payload: BasicPayload = self.post("/api/bazi/basic", query).await?;
        ensure_valid(payload.bazi_result)
    }

    async fn request_interpretation(
        &self,
        query: &Query,
        basic: &BasicResult,
    ) -> Result<InterpretiveResult> {
        let request = InterpretationRequest {
            user_info: query.profile(),
            bazi_result: basic,
        };
        let payload: InterpretationPayload = self.post("/api/bazi/analysis", &request).await?;
        Ok(payload.analysis_result)
    }

    async fn request_direction_advice(&self, direction: &str) -> Result<DirectionAdvice> {
        let payload: AdvicePayload = self
            .post("/api/fengshui/advice", &AdviceRequest::direction(direction))
            .await?;
        ensure_valid(payload.fengshui_advice)
    }

    async fn request_daily_fortune(
        &self,
        date: Option<NaiveDate>,
        basic: Option<&BasicResult>,
    ) -> Result<DailyFortune> {
        let mut params = Vec::new();
        if let Some(date) = date {
            params.push(("date", date.format(DATE_FORMAT).to_string()));
        }
        if let Some(basic) = basic {
            let encoded = serde_json::to_string(basic)
                .map_err(|e| ErrorKind::validation("user_bazi", "<bazi>", e.to_string()))?;
            params.push(("user_bazi", encoded));
        }

        let fortune: DailyFortune = self.get("/api/daily/fortune", &params).await?;
        ensure_valid(fortune)
    }
}
