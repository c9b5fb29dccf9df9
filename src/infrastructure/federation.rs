use crate::domain::ports::{NameRecord, NamingResolver, ResolveError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Resolves `name*domain` addresses through the federation protocol.
///
/// The domain's `stellar.toml` names its federation server, which is then
/// queried with `type=name`. Identifiers without a `*` are returned as-is.
#[derive(Clone)]
pub struct FederationClient {
    scheme: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct StellarToml {
    #[serde(rename = "FEDERATION_SERVER")]
    federation_server: Option<String>,
}

#[derive(Deserialize)]
struct FederationResponse {
    account_id: String,
    #[serde(default)]
    memo_type: Option<String>,
    #[serde(default)]
    memo: Option<Value>,
}

impl Default for FederationClient {
    fn default() -> Self {
        Self::new("https")
    }
}

impl FederationClient {
    pub fn new(scheme: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn federation_server(&self, domain: &str) -> Result<String, ResolveError> {
        let url = format!("{}://{}/.well-known/stellar.toml", self.scheme, domain);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| ResolveError::Transport(err.to_string()))?;
        if !resp.status().is_success() {
            return Err(ResolveError::Transport(format!(
                "{url} responded with status {}",
                resp.status()
            )));
        }

        let text = resp
            .text()
            .await
            .map_err(|err| ResolveError::Transport(err.to_string()))?;
        let parsed: StellarToml =
            toml::from_str(&text).map_err(|err| ResolveError::Malformed(err.to_string()))?;
        parsed
            .federation_server
            .ok_or_else(|| ResolveError::Malformed(format!("{domain} has no FEDERATION_SERVER")))
    }
}

fn memo_text(memo: Value) -> Option<String> {
    match memo {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[async_trait]
impl NamingResolver for FederationClient {
    async fn resolve(&self, identifier: &str) -> Result<NameRecord, ResolveError> {
        let Some((name, domain)) = identifier.rsplit_once('*') else {
            return Ok(NameRecord {
                account_id: identifier.to_string(),
                ..Default::default()
            });
        };
        if name.is_empty() || domain.is_empty() {
            return Err(ResolveError::MalformedAddress(identifier.to_string()));
        }

        let server = self.federation_server(domain).await?;
        debug!(%server, identifier, "Querying federation server");

        let resp = self
            .client
            .get(&server)
            .query(&[("q", identifier), ("type", "name")])
            .send()
            .await
            .map_err(|err| ResolveError::Transport(err.to_string()))?;

        match resp.status() {
            StatusCode::NOT_FOUND => return Err(ResolveError::NotFound(identifier.to_string())),
            status if !status.is_success() => {
                return Err(ResolveError::Transport(format!(
                    "federation server responded with status {status}"
                )));
            }
            _ => {}
        }

        let record: FederationResponse = resp
            .json()
            .await
            .map_err(|err| ResolveError::Malformed(err.to_string()))?;

        Ok(NameRecord {
            account_id: record.account_id,
            memo_type: record.memo_type,
            memo: record.memo.and_then(memo_text),
        })
    }
}
