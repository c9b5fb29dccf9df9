use super::account::{AccountId, AccountState};
use super::payment::ComplianceSend;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Raw answer from a naming lookup. The account id is not validated yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameRecord {
    pub account_id: String,
    pub memo_type: Option<String>,
    pub memo: Option<String>,
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("malformed address: {0}")]
    MalformedAddress(String),
    #[error("no record for {0}")]
    NotFound(String),
    #[error("naming service transport error: {0}")]
    Transport(String),
    #[error("naming service returned an unexpected response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("account not found")]
    NotFound,
    #[error("ledger transport error: {0}")]
    Transport(String),
    #[error("ledger rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("ledger returned an unexpected response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("compliance transport error: {0}")]
    Transport(String),
    #[error("compliance server responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("compliance server returned an unexpected body: {0}")]
    Malformed(String),
}

/// Result of a successful submission, returned to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SubmissionResult(pub serde_json::Value);

/// Resolves human-readable destination identifiers to ledger accounts.
#[async_trait]
pub trait NamingResolver: Send + Sync {
    async fn resolve(&self, identifier: &str) -> Result<NameRecord, ResolveError>;
}

/// Read and write access to the ledger network.
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// Fetches the current state of an account. A missing account must be
    /// reported as [`LedgerError::NotFound`], never as a transport failure.
    async fn load_account(&self, account_id: &AccountId) -> Result<AccountState, LedgerError>;

    async fn submit(&self, envelope_base64: &str) -> Result<SubmissionResult, LedgerError>;
}

/// External service that pre-approves and pre-builds compliant transactions.
#[async_trait]
pub trait ComplianceRelay: Send + Sync {
    /// Returns the base64 XDR of the transaction to sign.
    async fn send(&self, request: &ComplianceSend) -> Result<String, RelayError>;
}

pub type NamingResolverBox = Box<dyn NamingResolver>;
pub type LedgerQueryBox = Box<dyn LedgerQuery>;
pub type ComplianceRelayBox = Box<dyn ComplianceRelay>;
