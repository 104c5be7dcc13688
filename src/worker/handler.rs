//! Lambda handler for recap runs.
//!
//! Accepts three event shapes:
//! - HTTP requests (Function URL / API Gateway), answered with a JSON array of reports
//! - `EventBridge` scheduled events, whose reports are logged
//! - Direct invocations, answered with the bare JSON array

use chrono::Utc;
use lambda_runtime::{Error, LambdaEvent};
use serde_json::{Value, json};
use tracing::{error, info};
use uuid::Uuid;

use super::pipeline::run_pipeline;
use super::report::format_reports;
use crate::ai::LlmClient;
use crate::core::config::{AppConfig, check_lookback_days, parse_lookback_days};
use crate::discord::DiscordClient;

pub use self::function_handler as handler;

/// How the run was triggered, with any lookback override it carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Http { days: Option<u32> },
    Scheduled,
    Direct { days: Option<u32> },
}

fn days_field(value: Option<&Value>) -> Result<Option<u32>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => parse_lookback_days(s).map(Some),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|d| u32::try_from(d).ok())
            .ok_or_else(|| format!("invalid days value: {n}"))
            .and_then(check_lookback_days)
            .map(Some),
        Some(other) => Err(format!("invalid days value: {other}")),
    }
}

/// Classify an incoming event.
///
/// # Errors
///
/// Returns a message when a `days` override is present but not a positive integer.
pub fn parse_trigger(payload: &Value) -> Result<Trigger, String> {
    if payload.get("source").and_then(Value::as_str) == Some("aws.events") {
        return Ok(Trigger::Scheduled);
    }

    if payload.get("requestContext").is_some() {
        let days = days_field(
            payload
                .get("queryStringParameters")
                .and_then(|q| q.get("days")),
        )?;
        return Ok(Trigger::Http { days });
    }

    Ok(Trigger::Direct {
        days: days_field(payload.get("days"))?,
    })
}

#[must_use]
pub fn ok_json(reports: &[String]) -> Value {
    json!({
        "statusCode": 200,
        "headers": { "Content-Type": "application/json" },
        "body": json!(reports).to_string()
    })
}

#[must_use]
pub fn err_response(status_code: u16, message: &str) -> Value {
    json!({
        "statusCode": status_code,
        "headers": { "Content-Type": "application/json" },
        "body": json!({ "error": message }).to_string()
    })
}

/// Lambda entrypoint: fetch, summarize and report every configured channel.
///
/// # Errors
///
/// Fails the invocation only on configuration errors. Per-channel summary
/// failures are rendered into that channel's report instead.
#[tracing::instrument(level = "info", skip(event), fields(run_id = %Uuid::new_v4()))]
pub async fn function_handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;

    let trigger = match parse_trigger(&event.payload) {
        Ok(trigger) => trigger,
        Err(e) => {
            error!("Rejected trigger: {}", e);
            if event.payload.get("requestContext").is_some() {
                return Ok(err_response(400, &e));
            }
            return Err(Error::from(e));
        }
    };
    info!("Recap triggered: {:?}", trigger);

    let mut pipeline = config.pipeline_config();
    if let Trigger::Http { days: Some(days) } | Trigger::Direct { days: Some(days) } = trigger {
        pipeline = pipeline.with_lookback_days(days);
    }

    let source = DiscordClient::new(
        config.discord_api_token.clone(),
        config.discord_api_base.as_deref(),
    )?;
    let llm_client = LlmClient::new(
        config.openai_api_key.clone(),
        config.openai_org_id.clone(),
        config.openai_api_base.clone(),
    );

    let outcomes = run_pipeline(&source, &llm_client, &pipeline, Utc::now()).await;
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    let reports = format_reports(&outcomes);

    info!(
        "Recap finished: {} channels, {} failed",
        reports.len(),
        failed
    );

    match trigger {
        Trigger::Http { .. } => Ok(ok_json(&reports)),
        Trigger::Scheduled => {
            for report in &reports {
                info!("{}", report);
            }
            Ok(json!(reports))
        }
        Trigger::Direct { .. } => Ok(json!(reports)),
    }
}
