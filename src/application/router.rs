use super::assembler::TransactionAssembler;
use super::asset_selector::select_operation;
use super::cancel::Cancellation;
use super::classifier::classify;
use super::resolver::resolve_destination;
use crate::domain::account::{AccountId, AccountState, SecretSeed};
use crate::domain::memo::resolve_memo;
use crate::domain::payment::{ComplianceSend, PaymentRequest};
use crate::domain::ports::{
    ComplianceRelay, ComplianceRelayBox, LedgerError, LedgerQueryBox, NamingResolverBox,
    SubmissionResult,
};
use crate::domain::transaction::Transaction;
use crate::error::{PaymentError, Result};
use crate::xdr;
use tracing::{error, info, warn};

/// Which path a request takes through the router.
pub enum Route<'a> {
    /// Out-of-band memo present and a compliance service configured: the
    /// compliance service builds the transaction.
    ComplianceRelay(&'a dyn ComplianceRelay),
    /// The bridge resolves, validates and assembles the transaction itself.
    DirectAssembly,
}

/// Entry point for payment submissions.
///
/// Each call is an independent, stateless pipeline:
/// `Start -> {ComplianceRelay | DirectAssembly} -> Signed -> Submitted -> Done`,
/// where the first failure ends the request with a [`PaymentError`].
pub struct SubmissionRouter {
    naming: NamingResolverBox,
    ledger: LedgerQueryBox,
    compliance: Option<ComplianceRelayBox>,
    assembler: TransactionAssembler,
}

impl SubmissionRouter {
    /// Creates a router without a compliance service.
    ///
    /// # Arguments
    ///
    /// * `naming` - Resolver for destination identifiers.
    /// * `ledger` - Account queries and transaction submission.
    /// * `assembler` - Transaction builder bound to the target network.
    pub fn new(
        naming: NamingResolverBox,
        ledger: LedgerQueryBox,
        assembler: TransactionAssembler,
    ) -> Self {
        Self {
            naming,
            ledger,
            compliance: None,
            assembler,
        }
    }

    pub fn with_compliance(mut self, compliance: ComplianceRelayBox) -> Self {
        self.compliance = Some(compliance);
        self
    }

    pub fn route(&self, request: &PaymentRequest) -> Route<'_> {
        match (&self.compliance, request.extra_memo()) {
            (Some(relay), Some(_)) => Route::ComplianceRelay(relay.as_ref()),
            _ => Route::DirectAssembly,
        }
    }

    /// Runs the full pipeline for one request and returns the ledger's
    /// submission result unchanged.
    pub async fn submit_payment(
        &self,
        request: &PaymentRequest,
        cancel: &Cancellation,
    ) -> Result<SubmissionResult> {
        let seed = SecretSeed::parse(&request.source).map_err(|err| {
            info!(error = %err, "Invalid source parameter");
            PaymentError::InvalidSource
        })?;

        let tx = match self.route(request) {
            Route::ComplianceRelay(relay) => self.relay(relay, &seed, request, cancel).await?,
            Route::DirectAssembly => self.assemble(&seed, request, cancel).await?,
        };

        self.sign_and_submit(tx, &seed, cancel).await
    }

    async fn relay(
        &self,
        relay: &dyn ComplianceRelay,
        seed: &SecretSeed,
        request: &PaymentRequest,
        cancel: &Cancellation,
    ) -> Result<Transaction> {
        let send = ComplianceSend {
            source: seed.account_id().to_string(),
            sender: request.sender.clone(),
            destination: request.destination.clone(),
            amount: request.amount.clone(),
            asset_code: request.asset_code.clone(),
            asset_issuer: request.asset_issuer.clone(),
            extra_memo: request.extra_memo.clone(),
        };

        let encoded = cancel.guard(relay.send(&send)).await?.map_err(|err| {
            error!(error = %err, "Error sending request to compliance server");
            PaymentError::ServerError
        })?;

        xdr::decode_transaction_base64(&encoded).map_err(|err| {
            error!(error = %err, "Error decoding transaction returned by compliance server");
            PaymentError::ServerError
        })
    }

    async fn assemble(
        &self,
        seed: &SecretSeed,
        request: &PaymentRequest,
        cancel: &Cancellation,
    ) -> Result<Transaction> {
        let destination =
            resolve_destination(self.naming.as_ref(), &request.destination, cancel).await?;

        let intent = select_operation(
            self.ledger.as_ref(),
            request.asset_code(),
            request.asset_issuer(),
            &destination.account_id,
            &request.amount,
            cancel,
        )
        .await?;

        let memo = resolve_memo(
            request.memo_type(),
            request.memo(),
            destination.mandated_memo.as_ref(),
        )
        .inspect_err(|err| info!(memo_type = ?request.memo_type(), error = %err, "Rejected memo"))?;

        let source = seed.account_id();
        let snapshot = self.load_source(&source, cancel).await?;

        self.assembler
            .assemble(source, &snapshot, intent, memo)
            .map_err(|err| {
                let kind = classify(&err);
                warn!(error = %err, kind = kind.code(), "Transaction builder error");
                kind
            })
    }

    async fn load_source(
        &self,
        source: &AccountId,
        cancel: &Cancellation,
    ) -> Result<AccountState> {
        cancel
            .guard(self.ledger.load_account(source))
            .await?
            .map_err(|err| match err {
                LedgerError::NotFound => {
                    info!(%source, "Source account does not exist");
                    PaymentError::SourceAccountNotFound
                }
                other => {
                    error!(%source, error = %other, "Cannot load source account");
                    PaymentError::ServerError
                }
            })
    }

    async fn sign_and_submit(
        &self,
        tx: Transaction,
        seed: &SecretSeed,
        cancel: &Cancellation,
    ) -> Result<SubmissionResult> {
        let sequence = tx.sequence;
        let envelope = tx.sign(seed, self.assembler.network()).map_err(|err| {
            error!(error = %err, "Cannot sign transaction");
            PaymentError::ServerError
        })?;
        let encoded = envelope.to_base64().map_err(|err| {
            error!(error = %err, "Cannot encode transaction envelope");
            PaymentError::ServerError
        })?;

        let result = cancel
            .guard(self.ledger.submit(&encoded))
            .await?
            .map_err(|err| {
                error!(error = %err, "Error submitting transaction");
                PaymentError::ServerError
            })?;

        info!(source = %seed.account_id(), sequence, "Transaction submitted");
        Ok(result)
    }
}
