// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use pickup_app::{
    PickupServices, ScheduleRequest, ScheduleResponse, ServiceFailure, VerificationResponse,
    VerifyAddressRequest, ZipLookup,
};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const ZIP_LOOKUP_PATH: &str = "api/zipcode";
pub const VERIFY_ADDRESS_PATH: &str = "api/verify-address";
pub const SCHEDULE_PICKUP_PATH: &str = "api/quote/schedule-pickup";

/// Blocking HTTP client for the pickup backend.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("service.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("service.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "service.base_url must use http or https, got {:?}",
                parsed.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceFailure> {
        Url::parse(&format!("{}/{path}", self.base_url))
            .map_err(|error| ServiceFailure::Unreachable(format!("{} ({error})", self.base_url)))
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, ServiceFailure> {
        let response = request
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        debug!(endpoint = what, status = status.as_u16(), "pickup backend responded");
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        response
            .json()
            .map_err(|error| ServiceFailure::Decode(format!("{what}: {error}")))
    }
}

impl PickupServices for Client {
    fn lookup_zip(&self, zip: &str) -> Result<ZipLookup, ServiceFailure> {
        let mut url = self.endpoint(ZIP_LOOKUP_PATH)?;
        url.query_pairs_mut().append_pair("zip", zip);
        self.send_json(self.http.get(url), "zip lookup")
    }

    fn verify_address(&self, address: &str) -> Result<VerificationResponse, ServiceFailure> {
        let url = self.endpoint(VERIFY_ADDRESS_PATH)?;
        let body = VerifyAddressRequest {
            address: address.to_owned(),
        };
        self.send_json(self.http.post(url).json(&body), "address verification")
    }

    fn schedule_pickup(
        &self,
        request: &ScheduleRequest,
    ) -> Result<ScheduleResponse, ServiceFailure> {
        let url = self.endpoint(SCHEDULE_PICKUP_PATH)?;
        self.send_json(self.http.post(url).json(request), "schedule pickup")
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> ServiceFailure {
    if error.is_timeout() {
        return ServiceFailure::Unreachable(format!("{base_url} (request timed out)"));
    }
    ServiceFailure::Unreachable(format!("{base_url} ({error})"))
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
}

fn clean_error_response(status: StatusCode, body: &str) -> ServiceFailure {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .filter(|error| !error.trim().is_empty());
    ServiceFailure::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::{Client, clean_error_response};
    use pickup_app::ServiceFailure;
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn new_trims_trailing_slash() {
        let client = Client::new("http://localhost:3000/", Duration::from_secs(1))
            .expect("client should initialize");
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn new_rejects_empty_and_non_http_urls() {
        assert!(Client::new("  ", Duration::from_secs(1)).is_err());
        assert!(Client::new("ftp://example.com", Duration::from_secs(1)).is_err());
        assert!(Client::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let client = Client::new("http://localhost:3000/backend", Duration::from_secs(1))
            .expect("client should initialize");
        let url = client
            .endpoint("api/verify-address")
            .expect("endpoint should build");
        assert_eq!(url.as_str(), "http://localhost:3000/backend/api/verify-address");
    }

    #[test]
    fn error_envelope_message_is_kept() {
        let failure = clean_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"success":false,"error":"Quote has expired"}"#,
        );
        assert_eq!(
            failure,
            ServiceFailure::Rejected {
                status: 400,
                message: Some("Quote has expired".to_owned()),
            }
        );
        assert_eq!(failure.server_message(), Some("Quote has expired"));
    }

    #[test]
    fn non_json_error_body_has_no_message() {
        let failure = clean_error_response(StatusCode::BAD_GATEWAY, "<html>502</html>");
        assert_eq!(
            failure,
            ServiceFailure::Rejected {
                status: 502,
                message: None,
            }
        );
    }

    #[test]
    fn blank_error_field_is_ignored() {
        let failure = clean_error_response(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"  "}"#);
        assert_eq!(failure.server_message(), None);
    }
}
