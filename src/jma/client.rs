use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::jma::models::{AreaCatalog, ForecastDocument};

/// Client for the JMA `bosai` JSON endpoints.
#[derive(Debug, Clone)]
pub struct JmaClient {
    http_client: Client,
    area_url: String,
    forecast_base_url: String,
    icon_base_url: String,
}

impl JmaClient {
    /// Build a client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the TLS backend cannot be initialized.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.jma_timeout_seconds))
            .user_agent(concat!("jma-forecast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            area_url: config.jma_area_url.clone(),
            forecast_base_url: config.jma_forecast_base_url.trim_end_matches('/').to_string(),
            icon_base_url: config.jma_icon_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the area catalog (centers, offices, class10s).
    ///
    /// # Errors
    ///
    /// `AppError::Transport` if JMA cannot be reached or answers with an error
    /// status, `AppError::MalformedPayload` if `centers` or `offices` is missing.
    pub async fn get_area_catalog(&self) -> AppResult<AreaCatalog> {
        self.get_json(&self.area_url).await
    }

    /// Get the forecast document for a prefecture (office) or area code.
    ///
    /// # Errors
    ///
    /// `AppError::BadRequest` for a code that is not all digits, otherwise as
    /// [`Self::get_area_catalog`].
    pub async fn get_forecast(&self, code: &str) -> AppResult<ForecastDocument> {
        if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::BadRequest(format!(
                "Invalid JMA area code '{code}'"
            )));
        }

        let url = format!("{}/{code}.json", self.forecast_base_url);
        self.get_json(&url).await
    }

    /// Icon image for a weather code. Never fetched here.
    #[must_use]
    pub fn icon_url(&self, weather_code: &str) -> String {
        format!("{}/{weather_code}.png", self.icon_base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        tracing::debug!(url, "Fetching from JMA");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Transport(format!("HTTP {status} from {url}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to read body from {url}: {e}")))?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                url,
                body_preview = %text.chars().take(500).collect::<String>(),
                "Failed to parse JMA response"
            );
            AppError::MalformedPayload(format!("{url}: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_url_uses_configured_base() {
        let config = Config {
            jma_icon_base_url: "https://example.test/img/".to_string(),
            ..Config::default()
        };
        let client = JmaClient::new(&config).unwrap();
        assert_eq!(client.icon_url("100"), "https://example.test/img/100.png");
    }

    #[tokio::test]
    async fn non_numeric_codes_never_reach_the_network() {
        let client = JmaClient::new(&Config::default()).unwrap();
        let err = client.get_forecast("../area").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
