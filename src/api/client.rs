use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Serialize};

use crate::models::{Analysis, ApiEnvelope, ErrorBody, Report};
use crate::settings::Settings;

use super::ApiError;

const USER_AGENT: &str = concat!("siteaudit/", env!("CARGO_PKG_VERSION"));

/// Operations the results view needs from the audit backend.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// Requests a new scan of `url`.
    async fn start_analysis(&self, url: &str) -> Result<Analysis, ApiError>;

    async fn get_by_id(&self, analysis_id: &str) -> Result<Analysis, ApiError>;

    /// Free overview-tier report.
    async fn get_report(&self, analysis_id: &str) -> Result<Report, ApiError>;

    async fn get_detailed_report(&self, analysis_id: &str) -> Result<Report, ApiError>;

    /// Raw PDF bytes for the detailed report.
    async fn download_pdf(&self, analysis_id: &str) -> Result<Vec<u8>, ApiError>;

    async fn delete_account(&self) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub request_timeout: Duration,
    pub account_timeout: Duration,
}

impl From<&Settings> for ApiClientConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            base_url: settings.api_base_url.clone(),
            token: settings.api_token.clone(),
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            account_timeout: Duration::from_secs(settings.account_timeout_secs),
        }
    }
}

#[derive(Serialize)]
struct StartAnalysisRequest<'a> {
    url: &'a str,
}

/// `AnalysisApi` over the backend's REST endpoints.
pub struct HttpApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    request_timeout: Duration,
    account_timeout: Duration,
}

impl HttpApiClient {
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url).map_err(|err| {
            ApiError::InvalidRequest(format!("invalid base URL '{}': {err}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!(
                "base URL '{}' cannot carry a path",
                config.base_url
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            client,
            base_url,
            token: config.token.filter(|token| !token.trim().is_empty()),
            request_timeout: config.request_timeout,
            account_timeout: config.account_timeout,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(ApiError::InvalidRequest("empty path segment".into()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest("base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, timeout: Duration) -> RequestBuilder {
        let builder = self.client.request(method, url).timeout(timeout);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, timeout: Duration) -> Result<Response, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|err| ApiError::from_transport(err, timeout.as_secs()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        Err(ApiError::Status {
            status,
            message: body.into_message(),
        })
    }

    async fn fetch_envelope<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        timeout: Duration,
    ) -> Result<T, ApiError> {
        let response = self.send(builder, timeout).await?;
        let envelope = response
            .json::<ApiEnvelope<T>>()
            .await
            .map_err(|err| ApiError::InvalidResponse(err.to_string()))?;

        envelope
            .into_data()
            .map_err(|message| ApiError::Rejected { message })
    }
}

#[async_trait]
impl AnalysisApi for HttpApiClient {
    async fn start_analysis(&self, url: &str) -> Result<Analysis, ApiError> {
        let target = url.trim();
        if target.is_empty() {
            return Err(ApiError::InvalidRequest("website URL is required".into()));
        }

        let endpoint = self.endpoint(&["api", "analysis"])?;
        debug!("POST {endpoint} for {target}");
        let builder = self
            .request(Method::POST, endpoint, self.request_timeout)
            .json(&StartAnalysisRequest { url: target });
        self.fetch_envelope(builder, self.request_timeout).await
    }

    async fn get_by_id(&self, analysis_id: &str) -> Result<Analysis, ApiError> {
        let endpoint = self.endpoint(&["api", "analysis", analysis_id])?;
        debug!("GET {endpoint}");
        let builder = self.request(Method::GET, endpoint, self.request_timeout);
        self.fetch_envelope(builder, self.request_timeout).await
    }

    async fn get_report(&self, analysis_id: &str) -> Result<Report, ApiError> {
        let endpoint = self.endpoint(&["api", "analysis", analysis_id, "report"])?;
        debug!("GET {endpoint}");
        let builder = self.request(Method::GET, endpoint, self.request_timeout);
        self.fetch_envelope(builder, self.request_timeout).await
    }

    async fn get_detailed_report(&self, analysis_id: &str) -> Result<Report, ApiError> {
        let endpoint = self.endpoint(&["api", "analysis", analysis_id, "report", "detailed"])?;
        debug!("GET {endpoint}");
        let builder = self.request(Method::GET, endpoint, self.request_timeout);
        self.fetch_envelope(builder, self.request_timeout).await
    }

    async fn download_pdf(&self, analysis_id: &str) -> Result<Vec<u8>, ApiError> {
        let endpoint = self.endpoint(&["api", "analysis", analysis_id, "pdf"])?;
        debug!("GET {endpoint}");
        let builder = self
            .request(Method::GET, endpoint, self.request_timeout)
            .header(reqwest::header::ACCEPT, "application/pdf");
        let response = self.send(builder, self.request_timeout).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ApiError::from_transport(err, self.request_timeout.as_secs()))?;
        Ok(bytes.to_vec())
    }

    async fn delete_account(&self) -> Result<(), ApiError> {
        if self.token.is_none() {
            return Err(ApiError::MissingToken);
        }

        let endpoint = self.endpoint(&["api", "account"])?;
        debug!("DELETE {endpoint}");
        let builder = self.request(Method::DELETE, endpoint, self.account_timeout);
        self.send(builder, self.account_timeout).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ApiClientConfig {
        ApiClientConfig {
            base_url: base_url.to_string(),
            token: None,
            request_timeout: Duration::from_secs(30),
            account_timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn endpoint_appends_to_base_path() {
        let client = HttpApiClient::new(config("https://audit.example.com/v1/")).unwrap();
        let url = client.endpoint(&["api", "analysis", "abc"]).unwrap();
        assert_eq!(url.as_str(), "https://audit.example.com/v1/api/analysis/abc");
    }

    #[test]
    fn endpoint_escapes_ids() {
        let client = HttpApiClient::new(config("https://audit.example.com")).unwrap();
        let url = client.endpoint(&["api", "analysis", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "https://audit.example.com/api/analysis/a%2Fb%20c");
    }

    #[test]
    fn rejects_empty_segment_and_bad_base() {
        let client = HttpApiClient::new(config("https://audit.example.com")).unwrap();
        assert!(matches!(
            client.endpoint(&["api", "analysis", " "]),
            Err(ApiError::InvalidRequest(_))
        ));
        assert!(matches!(
            HttpApiClient::new(config("not a url")),
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[test]
    fn blank_token_is_treated_as_absent() {
        let mut cfg = config("https://audit.example.com");
        cfg.token = Some("   ".into());
        let client = HttpApiClient::new(cfg).unwrap();
        assert!(client.token.is_none());
    }
}
