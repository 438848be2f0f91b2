use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::{
    error::{RelayError, RelayResult},
    model::{Coordinate, FastingData, FastingDay},
};

use super::RamadanProvider;

/// Client for the islamicapi.com Ramadan endpoint.
#[derive(Debug, Clone)]
pub struct IslamicApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl IslamicApiProvider {
    pub fn with_options(api_key: String, base_url: String, timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { api_key, base_url, http })
    }
}

#[async_trait]
impl RamadanProvider for IslamicApiProvider {
    async fn fasting_days(&self, coordinate: &Coordinate) -> RelayResult<Vec<FastingDay>> {
        tracing::debug!(lat = %coordinate.lat, lon = %coordinate.lon, "Requesting Ramadan schedule");

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("lat", coordinate.lat.as_str()),
                ("lon", coordinate.lon.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        parse_fasting_days(status, &body)
    }
}

/// Validate a provider answer and extract its fasting days.
///
/// The `status` field is checked before anything else is read, whatever
/// the HTTP status code was.
fn parse_fasting_days(status: StatusCode, body: &str) -> RelayResult<Vec<FastingDay>> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(%status, body = %truncate_body(body), "Provider body is not JSON");
            if !status.is_success() {
                return Err(RelayError::UpstreamHttp { status: status.as_u16() });
            }
            return Err(err.into());
        }
    };

    let reported = value.get("status").and_then(Value::as_str);
    if reported != Some("success") {
        return Err(RelayError::UpstreamStatus { status: reported.map(str::to_string) });
    }

    let data = value
        .get("data")
        .ok_or_else(|| RelayError::Schema("missing `data` object".to_string()))?;

    let data = FastingData::deserialize(data).map_err(|e| RelayError::Schema(e.to_string()))?;

    Ok(data.fasting)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
