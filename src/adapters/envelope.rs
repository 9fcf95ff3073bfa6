//! Wire formats for the remote analysis service.
//!
//! Every endpoint answers with `{success, data?, error?}`. Decoding happens in
//! two steps: the envelope is opened (a `success=false` becomes
//! [`ErrorKind::ServerRejected`]), then `data` is parsed into the payload
//! schema of the endpoint. Anything that does not fit becomes
//! [`ErrorKind::MalformedResponse`] instead of leaking half-read values.

use crate::domain::model::{
    AuspiciousDay, BasicResult, ChartAdvice, DirectionAdvice, HealthStatus, InterpretiveResult,
    Query, UserProfile,
};
use crate::utils::error::{ErrorKind, Result};
use crate::utils::validation::Validate;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const MAX_ERROR_TEXT: usize = 200;

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Decode the body of a 2xx response.
pub fn decode_success<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| ErrorKind::MalformedResponse(format!("invalid envelope: {}", e)))?;
    open(envelope).and_then(parse_payload)
}

/// Classify a non-2xx response, preferring the service's own error text.
pub fn decode_failure(status: StatusCode, body: &[u8]) -> ErrorKind {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .or_else(|| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            (!text.is_empty()).then(|| text.chars().take(MAX_ERROR_TEXT).collect())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    ErrorKind::ServerError {
        status: status.as_u16(),
        message,
    }
}

/// The health endpoint may answer with a bare liveness body or an envelope.
pub fn decode_health(body: &[u8]) -> Result<HealthStatus> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| ErrorKind::MalformedResponse(format!("invalid health body: {}", e)))?;

    if value.get("success").is_some() {
        let envelope: Envelope = serde_json::from_value(value)
            .map_err(|e| ErrorKind::MalformedResponse(format!("invalid envelope: {}", e)))?;
        open(envelope).and_then(parse_payload)
    } else {
        parse_payload(value)
    }
}

/// Apply the domain invariants of a decoded payload; a violation is a schema error.
pub fn ensure_valid<T: Validate>(value: T) -> Result<T> {
    value
        .validate()
        .map_err(|e| ErrorKind::MalformedResponse(e.to_string()))?;
    Ok(value)
}

fn open(envelope: Envelope) -> Result<serde_json::Value> {
    if !envelope.success {
        return Err(ErrorKind::ServerRejected(
            envelope
                .error
                .unwrap_or_else(|| "request rejected without a reason".to_string()),
        ));
    }
    envelope.data.ok_or_else(|| {
        ErrorKind::MalformedResponse("envelope reported success without data".to_string())
    })
}

fn parse_payload<T: DeserializeOwned>(data: serde_json::Value) -> Result<T> {
    serde_json::from_value(data)
        .map_err(|e| ErrorKind::MalformedResponse(format!("unexpected payload: {}", e)))
}

#[derive(Debug, Deserialize)]
pub struct BasicPayload {
    pub bazi_result: BasicResult,
}

#[derive(Debug, Deserialize)]
pub struct InterpretationPayload {
    pub analysis_result: InterpretiveResult,
}

#[derive(Debug, Deserialize)]
pub struct AdvicePayload {
    pub fengshui_advice: DirectionAdvice,
}

#[derive(Debug, Deserialize)]
pub struct ConsultationPayload {
    pub fengshui_advice: ChartAdvice,
}

#[derive(Debug, Deserialize)]
pub struct AuspiciousPayload {
    pub auspicious_days: Vec<AuspiciousDay>,
}

#[derive(Debug, Serialize)]
pub struct InterpretationRequest<'a> {
    pub user_info: UserProfile,
    pub bazi_result: &'a BasicResult,
}

/// Body of `POST /api/fengshui/advice`.
///
/// A direction lookup sends only `query`; a consultation also carries the
/// profile and both analysis results so the service can advise on the chart.
#[derive(Debug, Serialize)]
pub struct AdviceRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bazi_result: Option<&'a BasicResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_result: Option<&'a InterpretiveResult>,
    pub query: AdviceQuery<'a>,
}

#[derive(Debug, Serialize)]
pub struct AdviceQuery<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_location: Option<&'a str>,
}

impl<'a> AdviceRequest<'a> {
    pub fn direction(direction: &'a str) -> Self {
        Self {
            user_info: None,
            bazi_result: None,
            analysis_result: None,
            query: AdviceQuery {
                kind: "direction_analysis",
                direction: Some(direction),
                user_location: None,
            },
        }
    }

    pub fn consultation(
        query: &'a Query,
        basic: &'a BasicResult,
        interpretation: &'a InterpretiveResult,
    ) -> Self {
        Self {
            user_info: Some(query.profile()),
            bazi_result: Some(basic),
            analysis_result: Some(interpretation),
            query: AdviceQuery {
                kind: "personal_consultation",
                direction: None,
                user_location: Some(query.location.as_str()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompleteRequest<'a> {
    pub user_info: &'a Query,
}
