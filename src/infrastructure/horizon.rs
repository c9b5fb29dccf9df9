use crate::domain::account::{AccountId, AccountState};
use crate::domain::ports::{LedgerError, LedgerQuery, SubmissionResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

/// Ledger access over the Horizon REST API.
#[derive(Clone)]
pub struct HorizonClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct AccountResponse {
    sequence: String,
}

impl HorizonClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

fn transport(err: reqwest::Error) -> LedgerError {
    LedgerError::Transport(err.to_string())
}

#[async_trait]
impl LedgerQuery for HorizonClient {
    async fn load_account(&self, account_id: &AccountId) -> Result<AccountState, LedgerError> {
        let resp = self
            .client
            .get(format!("{}/accounts/{}", self.base_url, account_id))
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LedgerError::NotFound);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LedgerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let account: AccountResponse = resp
            .json()
            .await
            .map_err(|err| LedgerError::Malformed(err.to_string()))?;
        let sequence = account
            .sequence
            .parse::<i64>()
            .map_err(|err| LedgerError::Malformed(format!("sequence: {err}")))?;

        Ok(AccountState {
            account_id: *account_id,
            sequence,
        })
    }

    async fn submit(&self, envelope_base64: &str) -> Result<SubmissionResult, LedgerError> {
        let resp = self
            .client
            .post(format!("{}/transactions", self.base_url))
            .form(&[("tx", envelope_base64)])
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LedgerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        resp.json()
            .await
            .map(SubmissionResult)
            .map_err(|err| LedgerError::Malformed(err.to_string()))
    }
}
