#![allow(dead_code)]

use ed25519_dalek::{Signature, Verifier};
use payment_bridge::application::assembler::TransactionAssembler;
use payment_bridge::application::router::SubmissionRouter;
use payment_bridge::domain::account::AccountId;
use payment_bridge::domain::payment::PaymentRequest;
use payment_bridge::domain::transaction::{NetworkId, TransactionEnvelope};
use payment_bridge::infrastructure::in_memory::{
    InMemoryLedger, ScriptedComplianceRelay, StaticNamingResolver,
};
use payment_bridge::xdr;

pub const PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// Secret seed of the paying account, `[7; 32]`.
pub const SOURCE_SEED: &str = "SADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQP54X";
pub const SOURCE: &str = "GDVEU3DD4KOFECV66VIHWEZOYX4ZKR3WV27L464SIIPOU2IUI3JCZA57";
pub const SOURCE_SEQUENCE: i64 = 100;

pub const DESTINATION: &str = "GD6ROJBYLKQMOW3E7N4M2YBPUHMZD7PL65VRHRMO24BOVSBV5H3BQRSL";
pub const ISSUER: &str = "GBTL47RTFR5EKMZSXWOQU735WBK7LRPPDIDK3JTNTCZZ7NUBBRDTVSK2";

pub fn account(address: &str) -> AccountId {
    AccountId::parse(address).unwrap()
}

/// In-memory collaborators wired into a router, with the source account
/// already on the ledger.
pub struct Harness {
    pub naming: StaticNamingResolver,
    pub ledger: InMemoryLedger,
    pub router: SubmissionRouter,
}

impl Harness {
    pub async fn new() -> Self {
        Self::build(None).await
    }

    pub async fn with_compliance(relay: ScriptedComplianceRelay) -> Self {
        Self::build(Some(relay)).await
    }

    async fn build(relay: Option<ScriptedComplianceRelay>) -> Self {
        let naming = StaticNamingResolver::new();
        let ledger = InMemoryLedger::new();
        ledger
            .create_account(account(SOURCE), SOURCE_SEQUENCE)
            .await;

        let mut router = SubmissionRouter::new(
            Box::new(naming.clone()),
            Box::new(ledger.clone()),
            TransactionAssembler::new(PASSPHRASE, 100),
        );
        if let Some(relay) = relay {
            router = router.with_compliance(Box::new(relay));
        }

        Self {
            naming,
            ledger,
            router,
        }
    }

    /// Decodes the most recent accepted submission.
    pub async fn last_envelope(&self) -> TransactionEnvelope {
        let submissions = self.ledger.submissions().await;
        let last = submissions.last().expect("no submission recorded");
        xdr::decode_envelope_base64(last).unwrap()
    }
}

/// Asserts the envelope carries exactly one valid signature by the source.
pub fn assert_signed_by_source(envelope: &TransactionEnvelope) {
    let source = account(SOURCE);
    assert_eq!(envelope.signatures.len(), 1);
    let decorated = &envelope.signatures[0];
    assert_eq!(decorated.hint, source.hint());

    let hash = envelope.tx.hash(&NetworkId::from_passphrase(PASSPHRASE)).unwrap();
    let signature = Signature::from_slice(&decorated.signature).unwrap();
    source
        .verifying_key()
        .unwrap()
        .verify(&hash, &signature)
        .expect("signature does not verify");
}

pub fn request(destination: &str, amount: &str) -> PaymentRequest {
    PaymentRequest {
        source: SOURCE_SEED.to_string(),
        destination: destination.to_string(),
        amount: amount.to_string(),
        ..Default::default()
    }
}
