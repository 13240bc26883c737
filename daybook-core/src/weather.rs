//! Optional weather/location enrichment.
//!
//! Lookups are best effort: a failure is logged and the entry is saved without weather.
//! Nothing here retries.

use crate::entry::WeatherContext;
use anyhow::{Result, bail};
use chrono::NaiveDate;
use std::future::Future;

pub trait WeatherProvider: Send + Sync {
    fn current_context(&self) -> impl Future<Output = Result<WeatherContext>> + Send;

    fn context_for_date(&self, date: NaiveDate) -> impl Future<Output = Result<WeatherContext>> + Send;
}

/// Provider used when no weather service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWeather;

impl WeatherProvider for NoWeather {
    async fn current_context(&self) -> Result<WeatherContext> {
        bail!("no weather provider configured")
    }

    async fn context_for_date(&self, _date: NaiveDate) -> Result<WeatherContext> {
        bail!("no weather provider configured")
    }
}

/// Current conditions for `today`, historical ones for past dates, nothing for the future.
pub async fn capture<W: WeatherProvider>(provider: &W, date: NaiveDate, today: NaiveDate) -> Option<WeatherContext> {
    let lookup = if date == today {
        provider.current_context().await
    } else if date < today {
        provider.context_for_date(date).await
    } else {
        return None;
    };
    match lookup {
        Ok(context) => Some(context),
        Err(error) => {
            tracing::warn!(date = %date, error = %error, "weather lookup failed, saving without it");
            None
        }
    }
}
