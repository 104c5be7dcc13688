use std::env;
use std::time::Duration;

use crate::core::models::Channel;

pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;
/// Upper bound on a lookback window, roughly ten years.
pub const MAX_LOOKBACK_DAYS: u32 = 3650;
pub const DEFAULT_PAGE_SIZE: u8 = 100;
pub const DEFAULT_MAX_RATE_LIMIT_RETRIES: u32 = 10;
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo";
pub const DEFAULT_TEMPERATURE: f64 = 0.2;

/// Added on top of every server-specified rate-limit delay.
pub const RATE_LIMIT_SAFETY_MARGIN: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub discord_api_token: String,
    pub discord_api_base: Option<String>,
    pub openai_api_key: String,
    pub openai_api_base: Option<String>,
    pub openai_org_id: Option<String>,
    pub openai_model: Option<String>,
    pub channels: Vec<Channel>,
    pub lookback_days: u32,
    pub max_rate_limit_retries: Option<u32>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let channels_raw =
            env::var("RECAP_CHANNELS").map_err(|e| format!("RECAP_CHANNELS: {}", e))?;

        let lookback_days = match env::var("RECAP_LOOKBACK_DAYS") {
            Ok(raw) => {
                parse_lookback_days(&raw).map_err(|e| format!("RECAP_LOOKBACK_DAYS: {}", e))?
            }
            Err(_) => DEFAULT_LOOKBACK_DAYS,
        };

        let max_rate_limit_retries = match env::var("RECAP_MAX_RATE_LIMIT_RETRIES") {
            Ok(raw) => parse_retry_ceiling(&raw)
                .map_err(|e| format!("RECAP_MAX_RATE_LIMIT_RETRIES: {}", e))?,
            Err(_) => Some(DEFAULT_MAX_RATE_LIMIT_RETRIES),
        };

        Ok(Self {
            discord_api_token: env::var("DISCORD_API_TOKEN")
                .map_err(|e| format!("DISCORD_API_TOKEN: {}", e))?,
            discord_api_base: env::var("DISCORD_API_BASE").ok(),
            openai_api_key: env::var("OPENAI_API_KEY")
                .map_err(|e| format!("OPENAI_API_KEY: {}", e))?,
            openai_api_base: env::var("OPENAI_API_BASE").ok(),
            openai_org_id: env::var("OPENAI_ORG_ID").ok(),
            openai_model: env::var("OPENAI_MODEL").ok(),
            channels: parse_channels(&channels_raw)
                .map_err(|e| format!("RECAP_CHANNELS: {}", e))?,
            lookback_days,
            max_rate_limit_retries,
        })
    }

    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            channels: self.channels.clone(),
            lookback_days: self.lookback_days,
            fetch: FetchOptions {
                page_size: DEFAULT_PAGE_SIZE,
                max_rate_limit_retries: self.max_rate_limit_retries,
                ..FetchOptions::default()
            },
            model: self
                .openai_model
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Knobs for a single paginated fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    pub page_size: u8,
    pub safety_margin: Duration,
    /// Consecutive rate-limit responses tolerated for one page. `None` retries forever.
    pub max_rate_limit_retries: Option<u32>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            safety_margin: RATE_LIMIT_SAFETY_MARGIN,
            max_rate_limit_retries: Some(DEFAULT_MAX_RATE_LIMIT_RETRIES),
        }
    }
}

/// Everything one pipeline run needs besides the two service clients.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub channels: Vec<Channel>,
    pub lookback_days: u32,
    pub fetch: FetchOptions,
    pub model: String,
    pub temperature: f64,
}

impl PipelineConfig {
    #[must_use]
    pub fn new(channels: Vec<Channel>) -> Self {
        Self {
            channels,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            fetch: FetchOptions::default(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    #[must_use]
    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }
}

/// Parses `name=id` pairs separated by commas, e.g. `#general=1209845180010856508`.
pub fn parse_channels(raw: &str) -> Result<Vec<Channel>, String> {
    let channels = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, id) = entry
                .split_once('=')
                .ok_or_else(|| format!("expected name=id, got '{entry}'"))?;
            let (name, id) = (name.trim(), id.trim());
            if name.is_empty() || id.is_empty() {
                return Err(format!("empty name or id in '{entry}'"));
            }
            if !id.chars().all(|c| c.is_ascii_digit()) {
                return Err(format!("channel id '{id}' is not numeric"));
            }
            Ok(Channel::new(name, id))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if channels.is_empty() {
        return Err("no channels configured".to_string());
    }

    Ok(channels)
}

pub fn parse_lookback_days(raw: &str) -> Result<u32, String> {
    let days = raw.trim().parse::<u32>().map_err(|e| e.to_string())?;
    check_lookback_days(days)
}

/// Accepts `1..=MAX_LOOKBACK_DAYS`.
pub fn check_lookback_days(days: u32) -> Result<u32, String> {
    match days {
        0 => Err("lookback must be at least one day".to_string()),
        d if d > MAX_LOOKBACK_DAYS => Err(format!(
            "lookback of {d} days exceeds the maximum of {MAX_LOOKBACK_DAYS}"
        )),
        d => Ok(d),
    }
}

/// `0` or `unbounded` disables the ceiling.
pub fn parse_retry_ceiling(raw: &str) -> Result<Option<u32>, String> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("unbounded") {
        return Ok(None);
    }
    match raw.parse::<u32>() {
        Ok(0) => Ok(None),
        Ok(n) => Ok(Some(n)),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channels_multiple_entries() {
        let channels =
            parse_channels("#development-chat=1209845180010856508, #general = 42").unwrap();
        assert_eq!(
            channels,
            vec![
                Channel::new("#development-chat", "1209845180010856508"),
                Channel::new("#general", "42"),
            ]
        );
    }

    #[test]
    fn test_parse_channels_rejects_bad_entries() {
        assert!(parse_channels("").is_err());
        assert!(parse_channels("#general").is_err());
        assert!(parse_channels("=123").is_err());
        assert!(parse_channels("#general=abc").is_err());
    }

    #[test]
    fn test_parse_lookback_days() {
        assert_eq!(parse_lookback_days("3"), Ok(3));
        assert!(parse_lookback_days("0").is_err());
        assert!(parse_lookback_days("-1").is_err());
        assert_eq!(parse_lookback_days("3650"), Ok(MAX_LOOKBACK_DAYS));
        assert!(parse_lookback_days("3651").is_err());
        assert!(parse_lookback_days("100000000").is_err());
    }

    #[test]
    fn test_parse_retry_ceiling() {
        assert_eq!(parse_retry_ceiling("5"), Ok(Some(5)));
        assert_eq!(parse_retry_ceiling("0"), Ok(None));
        assert_eq!(parse_retry_ceiling("Unbounded"), Ok(None));
        assert!(parse_retry_ceiling("lots").is_err());
    }

    #[test]
    fn test_pipeline_config_defaults() {
        let config = PipelineConfig::new(vec![Channel::new("#a", "1")]);
        assert_eq!(config.lookback_days, DEFAULT_LOOKBACK_DAYS);
        assert_eq!(config.fetch.page_size, 100);
        assert_eq!(config.fetch.safety_margin, Duration::from_millis(100));
        assert_eq!(config.model, "gpt-4-turbo");
    }
}
