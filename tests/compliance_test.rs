mod common;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::*;
use payment_bridge::application::assembler::TransactionAssembler;
use payment_bridge::application::cancel::Cancellation;
use payment_bridge::application::router::SubmissionRouter;
use payment_bridge::domain::asset::{Asset, AssetCode};
use payment_bridge::domain::memo::MemoDirective;
use payment_bridge::domain::payment::PaymentRequest;
use payment_bridge::domain::transaction::{Amount, Operation, OperationBody, TimeBounds, Transaction};
use payment_bridge::error::PaymentError;
use payment_bridge::infrastructure::compliance::HttpComplianceRelay;
use payment_bridge::infrastructure::in_memory::{
    InMemoryLedger, ScriptedComplianceRelay, StaticNamingResolver,
};
use payment_bridge::xdr;

fn compliant_transaction() -> Transaction {
    Transaction {
        source: account(SOURCE),
        fee: 100,
        sequence: SOURCE_SEQUENCE + 1,
        time_bounds: Some(TimeBounds {
            min_time: 0,
            max_time: 1_900_000_000,
        }),
        memo: MemoDirective::Hash([0x5a; 32]),
        operations: vec![Operation {
            source: None,
            body: OperationBody::Payment {
                destination: account(DESTINATION),
                asset: Asset::Credit {
                    code: AssetCode::new("USD").unwrap(),
                    issuer: account(ISSUER),
                },
                amount: Amount::from_stroops(200_000_000),
            },
        }],
    }
}

fn encoded(tx: &Transaction) -> String {
    STANDARD.encode(xdr::encode_transaction(tx).unwrap())
}

fn compliance_request() -> PaymentRequest {
    PaymentRequest {
        sender: "alice*bank.example".to_string(),
        asset_code: "USD".to_string(),
        asset_issuer: ISSUER.to_string(),
        extra_memo: "invoice 7".to_string(),
        ..request("bob*other.example", "20")
    }
}

#[tokio::test]
async fn test_relayed_transaction_is_signed_and_submitted() {
    let tx = compliant_transaction();
    let relay = ScriptedComplianceRelay::returning(encoded(&tx));
    let harness = Harness::with_compliance(relay.clone()).await;

    harness
        .router
        .submit_payment(&compliance_request(), &Cancellation::none())
        .await
        .unwrap();

    let envelope = harness.last_envelope().await;
    assert_eq!(envelope.tx, tx);
    assert_signed_by_source(&envelope);

    let requests = relay.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].source, SOURCE);
    assert_eq!(requests[0].sender, "alice*bank.example");
    assert_eq!(requests[0].destination, "bob*other.example");
    assert_eq!(requests[0].extra_memo, "invoice 7");

    // The destination is never resolved locally on this path.
    assert_eq!(harness.naming.call_count(), 0);
    assert_eq!(harness.ledger.load_calls(), 0);
}

#[tokio::test]
async fn test_relayed_binary_text_memo_is_submitted_unchanged() {
    let tx = Transaction {
        memo: MemoDirective::Text(vec![0xc3, 0x28, 0xff, b'!']),
        ..compliant_transaction()
    };
    let harness = Harness::with_compliance(ScriptedComplianceRelay::returning(encoded(&tx))).await;

    harness
        .router
        .submit_payment(&compliance_request(), &Cancellation::none())
        .await
        .unwrap();

    let envelope = harness.last_envelope().await;
    assert_eq!(envelope.tx, tx);
    assert_signed_by_source(&envelope);
}

#[tokio::test]
async fn test_compliance_failure_never_enters_direct_assembly() {
    let harness = Harness::with_compliance(ScriptedComplianceRelay::failing(500)).await;

    assert_eq!(
        harness
            .router
            .submit_payment(&compliance_request(), &Cancellation::none())
            .await,
        Err(PaymentError::ServerError)
    );
    assert_eq!(harness.naming.call_count(), 0);
    assert_eq!(harness.ledger.load_calls(), 0);
    assert_eq!(harness.ledger.submit_calls(), 0);
}

#[tokio::test]
async fn test_undecodable_relay_answer_is_server_error() {
    let harness =
        Harness::with_compliance(ScriptedComplianceRelay::returning("bm90IHhkcg==")).await;

    assert_eq!(
        harness
            .router
            .submit_payment(&compliance_request(), &Cancellation::none())
            .await,
        Err(PaymentError::ServerError)
    );
    assert_eq!(harness.ledger.submit_calls(), 0);
}

#[tokio::test]
async fn test_without_extra_memo_the_relay_is_skipped() {
    let relay = ScriptedComplianceRelay::failing(500);
    let harness = Harness::with_compliance(relay.clone()).await;

    let request = PaymentRequest {
        extra_memo: String::new(),
        ..compliance_request()
    };
    // Direct assembly now runs, and fails on the unknown federated name.
    assert_eq!(
        harness
            .router
            .submit_payment(&request, &Cancellation::none())
            .await,
        Err(PaymentError::UnresolvableDestination)
    );
    assert!(relay.requests().await.is_empty());
}

#[tokio::test]
async fn test_extra_memo_without_compliance_service_is_assembled_directly() {
    let harness = Harness::new().await;
    let request = PaymentRequest {
        extra_memo: "invoice 7".to_string(),
        ..request(DESTINATION, "1")
    };

    harness
        .router
        .submit_payment(&request, &Cancellation::none())
        .await
        .unwrap();
    assert_eq!(harness.naming.call_count(), 1);
}

#[tokio::test]
async fn test_http_compliance_service() {
    let tx = compliant_transaction();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/send")
        .match_body(mockito::Matcher::UrlEncoded(
            "source".into(),
            SOURCE.into(),
        ))
        .with_status(200)
        .with_body(serde_json::json!({ "transaction_xdr": encoded(&tx) }).to_string())
        .create_async()
        .await;

    let ledger = InMemoryLedger::new();
    ledger.create_account(account(SOURCE), SOURCE_SEQUENCE).await;
    let router = SubmissionRouter::new(
        Box::new(StaticNamingResolver::new()),
        Box::new(ledger.clone()),
        TransactionAssembler::new(PASSPHRASE, 100),
    )
    .with_compliance(Box::new(HttpComplianceRelay::new(&server.url())));

    let result = router
        .submit_payment(&compliance_request(), &Cancellation::none())
        .await
        .unwrap();

    assert_eq!(result.0["ledger"], 1);
    assert_eq!(ledger.sequence(&account(SOURCE)).await, Some(SOURCE_SEQUENCE + 1));
    mock.assert_async().await;
}
