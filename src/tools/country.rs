//! Country lookup against a REST Countries compatible API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

use super::fetch::fetch_with_retry;
use super::{invalid_params_output, Tool, ToolName};
use crate::textutil::group_thousands;

/// Placeholder for any field the API did not provide.
const NOT_AVAILABLE: &str = "N/A";

/// Looks up capital, population, region, currency, and languages.
pub struct CountryInfoTool {
    http: reqwest::Client,
    base_url: String,
    retry_delay: Duration,
}

#[derive(Deserialize)]
struct Args {
    country_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CountryRecord {
    name: Option<CountryNames>,
    capital: Option<Vec<String>>,
    population: Option<f64>,
    region: Option<String>,
    currencies: Option<Map<String, Value>>,
    languages: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CountryNames {
    common: Option<String>,
}

impl CountryInfoTool {
    /// `base_url` is the API root, e.g. `https://restcountries.com/v3.1`.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, retry_delay: Duration) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            retry_delay,
        }
    }

    fn lookup_url(&self, country_name: &str) -> Result<reqwest::Url, String> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|_| format!("cannot use {} as a base URL", self.base_url))?
            .pop_if_empty()
            .push("name")
            .push(country_name);
        Ok(url)
    }

    async fn lookup(&self, country_name: &str) -> String {
        let fail = |reason: String| {
            format!("Error fetching information about {country_name}: {reason}")
        };

        let url = match self.lookup_url(country_name) {
            Ok(url) => url,
            Err(err) => return fail(format!("Connection error: {err}")),
        };
        debug!(%url, "country lookup");
        let response = match fetch_with_retry(&self.http, &url, self.retry_delay).await {
            Ok(response) => response,
            Err(err) => return fail(format!("Connection error: {err}")),
        };
        let status = response.status();
        if !status.is_success() {
            return fail(format!("API error: {}", status.as_u16()));
        }
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(err) => return fail(format!("Connection error: {err}")),
        };
        let Some(first) = body.as_array().and_then(|matches| matches.first()) else {
            return fail("Country not found".to_string());
        };
        match serde_json::from_value::<CountryRecord>(first.clone()) {
            Ok(record) => format_country(country_name, &record),
            Err(err) => fail(format!("Connection error: {err}")),
        }
    }
}

fn format_country(requested: &str, record: &CountryRecord) -> String {
    let name = record
        .name
        .as_ref()
        .and_then(|names| names.common.as_deref())
        .unwrap_or(requested);
    let capital = record
        .capital
        .as_ref()
        .and_then(|capitals| capitals.first())
        .map(String::as_str)
        .unwrap_or(NOT_AVAILABLE);
    let population = record
        .population
        .filter(|p| p.is_finite() && *p >= 0.0)
        .map(|p| p.round() as u64)
        .unwrap_or(0);
    let region = record.region.as_deref().unwrap_or(NOT_AVAILABLE);
    let currency = record
        .currencies
        .as_ref()
        .and_then(|codes| codes.keys().next())
        .map(String::as_str)
        .unwrap_or(NOT_AVAILABLE);
    let languages = record
        .languages
        .as_ref()
        .map(|langs| {
            langs
                .values()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|joined| !joined.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    format!(
        "Information about {name}:\n\
         - Capital: {capital}\n\
         - Population: {}\n\
         - Region: {region}\n\
         - Currency: {currency}\n\
         - Languages: {languages}\n",
        group_thousands(population)
    )
}

#[async_trait]
impl Tool for CountryInfoTool {
    fn name(&self) -> ToolName {
        ToolName::CountryInfo
    }

    async fn execute(&self, arguments: Value) -> String {
        match serde_json::from_value::<Args>(arguments) {
            Ok(args) => self.lookup(&args.country_name).await,
            Err(_) => invalid_params_output(self.name().as_str()),
        }
    }
}
