//! reqwest-backed implementation of `PatientSource`.

use async_trait::async_trait;
use serde_json::Value;
use staywatch_core::{DashboardConfig, LookupErrorKind, PatientRecord, PatientSource, PatientSummary};
use tracing::{debug, warn};
use url::Url;

use crate::{classify_status, parse_census_value, parse_patient_value};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid service url {url}: {reason}")]
    InvalidServiceUrl { url: String, reason: String },
}

/// One GET per call, no retries and no client-side timeout.
#[derive(Debug, Clone)]
pub struct HttpPatientService {
    client: reqwest::Client,
    base: Url,
    config: DashboardConfig,
}

impl HttpPatientService {
    pub fn new(config: DashboardConfig) -> Result<Self, ClientError> {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: DashboardConfig) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidServiceUrl {
            url: config.service_url.clone(),
            reason,
        };
        let base = Url::parse(&config.service_url).map_err(|err| invalid(err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("url cannot carry a path".to_string()));
        }

        Ok(Self {
            client,
            base,
            config,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// `{service_url}/{patient_path}/{stay_id}`, the id encoded as one segment.
    pub fn patient_url(&self, stay_id: &str) -> Url {
        self.endpoint(&self.config.patient_path, &[stay_id])
    }

    pub fn census_url(&self) -> Url {
        self.endpoint(&self.config.census_path, &[&self.config.census_as_of])
    }

    fn endpoint(&self, path: &str, tail: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(path.split('/').filter(|part| !part.is_empty()))
                .extend(tail);
        }
        url
    }

    async fn get_json(&self, url: Url) -> Result<Value, LookupErrorKind> {
        debug!(%url, "requesting patient service");
        let response = self.client.get(url.clone()).send().await.map_err(|err| {
            warn!(%url, error = %err, "patient service unreachable");
            LookupErrorKind::NetworkError
        })?;

        let status = response.status();
        if !status.is_success() {
            let kind = classify_status(status);
            warn!(%url, %status, ?kind, "patient service rejected request");
            return Err(kind);
        }

        let body = response.text().await.map_err(|err| {
            warn!(%url, error = %err, "patient service body interrupted");
            LookupErrorKind::NetworkError
        })?;

        serde_json::from_str(&body).map_err(|err| {
            warn!(%url, error = %err, "patient service returned non-JSON body");
            LookupErrorKind::ParseError
        })
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PatientSource for HttpPatientService {
    async fn fetch_patient(&self, stay_id: &str) -> Result<PatientRecord, LookupErrorKind> {
        let body = self.get_json(self.patient_url(stay_id)).await?;
        parse_patient_value(&body)
    }

    async fn current_patients(&self) -> Result<Vec<PatientSummary>, LookupErrorKind> {
        let body = self.get_json(self.census_url()).await?;
        parse_census_value(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(url: &str) -> HttpPatientService {
        HttpPatientService::new(DashboardConfig {
            service_url: url.to_string(),
            ..DashboardConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn patient_url_encodes_identifier() {
        let svc = service("http://127.0.0.1:8000");
        assert_eq!(
            svc.patient_url("123").as_str(),
            "http://127.0.0.1:8000/api/v1/patient/123"
        );
        assert_eq!(
            svc.patient_url("a/b c").as_str(),
            "http://127.0.0.1:8000/api/v1/patient/a%2Fb%20c"
        );
    }

    #[test]
    fn base_path_is_preserved() {
        let svc = service("https://icu.example.org/dash/");
        assert_eq!(
            svc.census_url().as_str(),
            "https://icu.example.org/dash/api/v1/current-patients/2131-01-11%2004:20:05"
        );
    }

    #[test]
    fn rejects_unusable_urls() {
        let bad = HttpPatientService::new(DashboardConfig {
            service_url: "not a url".to_string(),
            ..DashboardConfig::default()
        });
        assert!(matches!(bad, Err(ClientError::InvalidServiceUrl { .. })));

        let opaque = HttpPatientService::new(DashboardConfig {
            service_url: "mailto:icu@example.org".to_string(),
            ..DashboardConfig::default()
        });
        assert!(opaque.is_err());
    }
}
