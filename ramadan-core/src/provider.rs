use crate::{
    Config, Coordinate, FastingDay, error::RelayResult, provider::islamicapi::IslamicApiProvider,
};
use anyhow::Context;
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod islamicapi;

/// Source of fasting-day schedules for a coordinate.
#[async_trait]
pub trait RamadanProvider: Send + Sync + Debug {
    async fn fasting_days(&self, coordinate: &Coordinate) -> RelayResult<Vec<FastingDay>>;
}

/// Construct the provider from config.
///
/// Returns `Ok(None)` when no API key is configured: the relay still
/// starts and answers calendar requests with a configuration error.
/// Invalid timeout or upstream URL values are rejected here so they fail
/// startup instead of every request.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Option<Arc<dyn RamadanProvider>>> {
    config.validate()?;

    let Some(api_key) = config.api_key() else {
        return Ok(None);
    };

    let provider = IslamicApiProvider::with_options(
        api_key.to_owned(),
        config.upstream_url.clone(),
        config.request_timeout(),
    )
    .context("Failed to build HTTP client for the Ramadan data provider")?;

    Ok(Some(Arc::new(provider)))
}

/// Like [`provider_from_config`], but a missing key is an error with a hint.
pub fn require_provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn RamadanProvider>> {
    provider_from_config(config)?.ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for the Ramadan data provider.\n\
             Hint: set ISLAMIC_API_KEY or run `ramadan configure`."
        )
    })
}
