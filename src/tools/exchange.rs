//! Exchange-rate lookup against an exchangerate-api compatible endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

use super::fetch::fetch_with_retry;
use super::{invalid_params_output, Tool, ToolName};

/// Looks up the latest rate between two ISO currency codes.
pub struct ExchangeRateTool {
    http: reqwest::Client,
    base_url: String,
    retry_delay: Duration,
}

#[derive(Deserialize)]
struct Args {
    base_currency: String,
    target_currency: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LatestRates {
    /// Null or absent rates read as "currency not found".
    rates: Option<Map<String, Value>>,
    date: Option<String>,
}

fn fail(reason: impl std::fmt::Display) -> String {
    format!("Error fetching exchange rate: {reason}")
}

impl ExchangeRateTool {
    /// `base_url` is the API root, e.g. `https://api.exchangerate-api.com/v4`.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, retry_delay: Duration) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            retry_delay,
        }
    }

    fn latest_url(&self, base: &str) -> Result<reqwest::Url, String> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|_| format!("cannot use {} as a base URL", self.base_url))?
            .pop_if_empty()
            .push("latest")
            .push(base);
        Ok(url)
    }

    async fn lookup(&self, base_currency: &str, target_currency: &str) -> String {
        let base = base_currency.to_uppercase();
        let target = target_currency.to_uppercase();

        let url = match self.latest_url(&base) {
            Ok(url) => url,
            Err(err) => return fail(format!("Connection error: {err}")),
        };
        debug!(%url, %target, "exchange rate lookup");
        let response = match fetch_with_retry(&self.http, &url, self.retry_delay).await {
            Ok(response) => response,
            Err(err) => return fail(format!("Connection error: {err}")),
        };
        let status = response.status();
        if !status.is_success() {
            return fail(format!("API error: {}", status.as_u16()));
        }
        let latest: LatestRates = match response.json().await {
            Ok(latest) => latest,
            Err(err) => return fail(format!("Connection error: {err}")),
        };
        let Some(rate) = latest
            .rates
            .as_ref()
            .and_then(|rates| rates.get(&target))
            .and_then(Value::as_f64)
        else {
            return fail(format!("Currency {target} not found"));
        };
        let date = latest.date.as_deref().unwrap_or("N/A");

        format!(
            "Exchange rate:\n\
             - {base} → {target}\n\
             - Rate: 1 {base} = {rate:.4} {target}\n\
             - Date: {date}\n"
        )
    }
}

#[async_trait]
impl Tool for ExchangeRateTool {
    fn name(&self) -> ToolName {
        ToolName::ExchangeRate
    }

    async fn execute(&self, arguments: Value) -> String {
        match serde_json::from_value::<Args>(arguments) {
            Ok(args) => self.lookup(&args.base_currency, &args.target_currency).await,
            Err(_) => invalid_params_output(self.name().as_str()),
        }
    }
}
