//! HTTP boundary - one endpoint, thin by design
//!
//! `GET /tax?start_date=<unix seconds>&amount_of_days=<n>` renders the
//! engine's report inside a `{data, message, code}` envelope. Malformed
//! input is rejected before any store access; engine failures surface as a
//! server error carrying the failure message.

use crate::engine::{EngineError, TaxEngine, TaxReport};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TaxEngine>,
}

#[derive(Debug, Deserialize)]
pub struct TaxQuery {
    start_date: Option<i64>,
    amount_of_days: Option<i64>,
}

/// Response envelope shared by every outcome
#[derive(Debug, Serialize)]
pub struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<TaxReport>,
    pub message: String,
    pub code: u16,
}

fn reply(status: StatusCode, data: Option<TaxReport>, message: impl Into<String>) -> Response {
    let envelope = Envelope {
        data,
        message: message.into(),
        code: status.as_u16(),
    };
    (status, Json(envelope)).into_response()
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/tax", get(get_tax)).with_state(state)
}

async fn get_tax(State(state): State<AppState>, Query(query): Query<TaxQuery>) -> Response {
    let (Some(start_date), Some(amount_of_days)) = (query.start_date, query.amount_of_days)
    else {
        log::warn!("rejected /tax request with missing query params");
        return reply(
            StatusCode::BAD_REQUEST,
            None,
            "start_date and amount_of_days are required",
        );
    };

    match state.engine.report(start_date, amount_of_days).await {
        Ok(report) => reply(StatusCode::OK, Some(report), "success get tax"),
        Err(err @ EngineError::InvalidRange(_)) => {
            log::warn!("rejected /tax request: {}", err);
            reply(StatusCode::BAD_REQUEST, None, err.to_string())
        }
        Err(err) => {
            log::error!("❌ /tax request failed: {}", err);
            reply(StatusCode::INTERNAL_SERVER_ERROR, None, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DailySummary;

    #[test]
    fn test_report_wire_format() {
        let report = TaxReport {
            summary: vec![DailySummary {
                deposit_total: 1_000,
                withdraw_total: 400,
                fee_total: 90,
                upline_bonus_total: 5,
                remain_total: 85,
                ppn_total: 10,
                day_of_month: 3,
            }],
            total_revenue: 90,
            total_bank_fee: 0,
            total_upline_bonus: 5,
            total_remain: 85,
            total_ppn: 10,
        };

        let value = serde_json::to_value(&report).unwrap();
        let day = &value["summary"][0];
        assert_eq!(day["deposit"], 1_000);
        assert_eq!(day["withdraw"], 400);
        assert_eq!(day["fee"], 90);
        assert_eq!(day["upline_bonus"], 5);
        assert_eq!(day["remain"], 85);
        assert_eq!(day["ppn"], 10);
        assert_eq!(day["day_of_month"], 3);
        assert_eq!(value["total_revenue"], 90);
        assert_eq!(value["total_bank_fee"], 0);

        let envelope = Envelope {
            data: Some(report),
            message: "success get tax".to_string(),
            code: 200,
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["code"], 200);
        assert_eq!(value["message"], "success get tax");
        assert_eq!(value["data"]["total_ppn"], 10);
    }

    #[test]
    fn test_error_envelope_omits_data() {
        let envelope = Envelope {
            data: None,
            message: "bad request".to_string(),
            code: 400,
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value.get("data").is_none());
        assert_eq!(value["code"], 400);
    }
}
