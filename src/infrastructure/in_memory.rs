use crate::domain::account::{AccountId, AccountState};
use crate::domain::payment::ComplianceSend;
use crate::domain::ports::{
    ComplianceRelay, LedgerError, LedgerQuery, NameRecord, NamingResolver, RelayError,
    ResolveError, SubmissionResult,
};
use crate::xdr;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// A naming resolver backed by a fixed table of records.
///
/// Identifiers without a `*` are treated as raw account ids and returned
/// unchanged, mirroring how federation addresses behave.
#[derive(Default, Clone)]
pub struct StaticNamingResolver {
    records: Arc<RwLock<HashMap<String, NameRecord>>>,
    calls: Arc<AtomicUsize>,
}

impl StaticNamingResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, identifier: &str, record: NameRecord) {
        let mut records = self.records.write().await;
        records.insert(identifier.to_string(), record);
    }

    /// Number of `resolve` calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NamingResolver for StaticNamingResolver {
    async fn resolve(&self, identifier: &str) -> Result<NameRecord, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !identifier.contains('*') {
            return Ok(NameRecord {
                account_id: identifier.to_string(),
                ..Default::default()
            });
        }
        let records = self.records.read().await;
        records
            .get(identifier)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(identifier.to_string()))
    }
}

/// A ledger that keeps account sequence numbers in memory.
///
/// Submissions are decoded, checked against the source account's next
/// sequence number and applied, so tests observe the same ordering rules the
/// real network enforces.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    accounts: Arc<RwLock<HashMap<AccountId, i64>>>,
    submissions: Arc<RwLock<Vec<String>>>,
    load_calls: Arc<AtomicUsize>,
    submit_calls: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_account(&self, account_id: AccountId, sequence: i64) {
        let mut accounts = self.accounts.write().await;
        accounts.insert(account_id, sequence);
    }

    pub async fn sequence(&self, account_id: &AccountId) -> Option<i64> {
        let accounts = self.accounts.read().await;
        accounts.get(account_id).copied()
    }

    /// Makes every call fail with a transport error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    /// Base64 envelopes accepted so far, oldest first.
    pub async fn submissions(&self) -> Vec<String> {
        self.submissions.read().await.clone()
    }

    fn check_available(&self) -> Result<(), LedgerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::Transport("ledger unavailable".to_string()));
        }
        Ok(())
    }
}

fn rejected(code: &str) -> LedgerError {
    LedgerError::Rejected {
        status: 400,
        body: json!({ "extras": { "result_codes": { "transaction": code } } }).to_string(),
    }
}

#[async_trait]
impl LedgerQuery for InMemoryLedger {
    async fn load_account(&self, account_id: &AccountId) -> Result<AccountState, LedgerError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let accounts = self.accounts.read().await;
        accounts
            .get(account_id)
            .map(|&sequence| AccountState {
                account_id: *account_id,
                sequence,
            })
            .ok_or(LedgerError::NotFound)
    }

    async fn submit(&self, envelope_base64: &str) -> Result<SubmissionResult, LedgerError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let envelope =
            xdr::decode_envelope_base64(envelope_base64).map_err(|_| rejected("tx_malformed"))?;
        let tx = &envelope.tx;

        let mut accounts = self.accounts.write().await;
        let current = *accounts.get(&tx.source).ok_or_else(|| rejected("tx_no_account"))?;
        if tx.sequence != current + 1 {
            return Err(rejected("tx_bad_seq"));
        }
        accounts.insert(tx.source, tx.sequence);
        drop(accounts);

        let mut submissions = self.submissions.write().await;
        submissions.push(envelope_base64.to_string());
        Ok(SubmissionResult(json!({
            "ledger": submissions.len(),
            "envelope_xdr": envelope_base64,
        })))
    }
}

#[derive(Clone)]
enum Script {
    Transaction(String),
    Status(u16),
}

/// A compliance relay that answers every request from a fixed script.
#[derive(Clone)]
pub struct ScriptedComplianceRelay {
    script: Script,
    requests: Arc<RwLock<Vec<ComplianceSend>>>,
}

impl ScriptedComplianceRelay {
    /// Answers with the given base64 transaction.
    pub fn returning(transaction_xdr: impl Into<String>) -> Self {
        Self {
            script: Script::Transaction(transaction_xdr.into()),
            requests: Arc::default(),
        }
    }

    /// Answers with the given non-success status.
    pub fn failing(status: u16) -> Self {
        Self {
            script: Script::Status(status),
            requests: Arc::default(),
        }
    }

    pub async fn requests(&self) -> Vec<ComplianceSend> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl ComplianceRelay for ScriptedComplianceRelay {
    async fn send(&self, request: &ComplianceSend) -> Result<String, RelayError> {
        self.requests.write().await.push(request.clone());
        match &self.script {
            Script::Transaction(xdr) => Ok(xdr.clone()),
            Script::Status(status) => Err(RelayError::Status {
                status: *status,
                body: String::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_resolver() {
        let resolver = StaticNamingResolver::new();
        resolver
            .insert(
                "alice*example.com",
                NameRecord {
                    account_id: "GALICE".to_string(),
                    ..Default::default()
                },
            )
            .await;

        let record = resolver.resolve("alice*example.com").await.unwrap();
        assert_eq!(record.account_id, "GALICE");
        assert!(matches!(
            resolver.resolve("bob*example.com").await,
            Err(ResolveError::NotFound(_))
        ));
        assert_eq!(resolver.resolve("GRAW").await.unwrap().account_id, "GRAW");
        assert_eq!(resolver.call_count(), 3);
    }

    #[tokio::test]
    async fn test_ledger_accounts() {
        let ledger = InMemoryLedger::new();
        let account = AccountId::from_bytes([1; 32]);
        assert!(matches!(
            ledger.load_account(&account).await,
            Err(LedgerError::NotFound)
        ));

        ledger.create_account(account, 7).await;
        let state = ledger.load_account(&account).await.unwrap();
        assert_eq!(state.sequence, 7);
        assert_eq!(ledger.load_calls(), 2);

        ledger.set_unavailable(true);
        assert!(matches!(
            ledger.load_account(&account).await,
            Err(LedgerError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_ledger_rejects_garbage_envelope() {
        let ledger = InMemoryLedger::new();
        assert!(matches!(
            ledger.submit("AAAA").await,
            Err(LedgerError::Rejected { status: 400, .. })
        ));
        assert!(ledger.submissions().await.is_empty());
    }

    #[tokio::test]
    async fn test_scripted_relay_records_requests() {
        let relay = ScriptedComplianceRelay::failing(500);
        let send = ComplianceSend {
            source: "GSRC".to_string(),
            sender: "alice*example.com".to_string(),
            destination: "bob*example.com".to_string(),
            amount: "1".to_string(),
            asset_code: String::new(),
            asset_issuer: String::new(),
            extra_memo: "kyc".to_string(),
        };
        assert!(matches!(
            relay.send(&send).await,
            Err(RelayError::Status { status: 500, .. })
        ));
        assert_eq!(relay.requests().await, vec![send]);
    }
}
