use crate::domain::payment::ComplianceSend;
use crate::domain::ports::{ComplianceRelay, RelayError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

/// Forwards payments that carry an out-of-band memo to a compliance service.
#[derive(Clone)]
pub struct HttpComplianceRelay {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SendResponse {
    transaction_xdr: String,
}

impl HttpComplianceRelay {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ComplianceRelay for HttpComplianceRelay {
    async fn send(&self, request: &ComplianceSend) -> Result<String, RelayError> {
        let resp = self
            .client
            .post(format!("{}/send", self.base_url))
            .form(request)
            .send()
            .await
            .map_err(|err| RelayError::Transport(err.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|err| RelayError::Transport(err.to_string()))?;
        if status != StatusCode::OK {
            return Err(RelayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str::<SendResponse>(&body)
            .map(|parsed| parsed.transaction_xdr)
            .map_err(|err| RelayError::Malformed(err.to_string()))
    }
}
