//! Big-endian XDR codec for the subset of ledger structures this bridge builds
//! and relays: transactions, single-key envelopes, create-account and payment
//! operations.

use crate::domain::account::AccountId;
use crate::domain::asset::{Asset, AssetCode};
use crate::domain::memo::MemoDirective;
use crate::domain::transaction::{
    Amount, DecoratedSignature, MEMO_TEXT_MAX, Operation, OperationBody, TimeBounds, Transaction,
    TransactionEnvelope,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Envelope type tag mixed into the signature payload.
pub const ENVELOPE_TYPE_TX: i32 = 2;

const KEY_TYPE_ED25519: i32 = 0;

const MEMO_NONE: i32 = 0;
const MEMO_TEXT: i32 = 1;
const MEMO_ID: i32 = 2;
const MEMO_HASH: i32 = 3;

const ASSET_NATIVE: i32 = 0;
const ASSET_ALPHANUM4: i32 = 1;
const ASSET_ALPHANUM12: i32 = 2;

const OP_CREATE_ACCOUNT: i32 = 0;
const OP_PAYMENT: i32 = 1;

const MAX_OPERATIONS: usize = 100;
const MAX_SIGNATURES: usize = 20;
const MAX_SIGNATURE_LEN: usize = 64;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum XdrError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
    #[error("unknown {kind} discriminant {value}")]
    UnknownDiscriminant { kind: &'static str, value: i32 },
    #[error("{what} length {len} exceeds maximum {max}")]
    TooLong {
        what: &'static str,
        len: usize,
        max: usize,
    },
    #[error("non-zero padding bytes")]
    Padding,
    #[error("invalid boolean {0}")]
    Bool(u32),
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

type Result<T> = std::result::Result<T, XdrError>;

#[derive(Default)]
struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    fn put_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_bool(&mut self, v: bool) {
        self.put_u32(v as u32);
    }

    fn put_fixed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.buf.resize(self.buf.len() + padding(bytes.len()), 0);
    }

    fn put_var(&mut self, what: &'static str, bytes: &[u8], max: usize) -> Result<()> {
        if bytes.len() > max {
            return Err(XdrError::TooLong {
                what,
                len: bytes.len(),
                max,
            });
        }
        self.put_u32(bytes.len() as u32);
        self.put_fixed(bytes);
        Ok(())
    }

    fn put_len(&mut self, what: &'static str, len: usize, max: usize) -> Result<()> {
        if len > max {
            return Err(XdrError::TooLong { what, len, max });
        }
        self.put_u32(len as u32);
        Ok(())
    }
}

struct XdrReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> XdrReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(XdrError::UnexpectedEof)?;
        let slice = self.buf.get(self.pos..end).ok_or(XdrError::UnexpectedEof)?;
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn get_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    fn get_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn get_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    fn get_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    fn get_bool(&mut self) -> Result<bool> {
        match self.get_u32()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(XdrError::Bool(other)),
        }
    }

    fn skip_padding(&mut self, len: usize) -> Result<()> {
        if self.take(padding(len))?.iter().any(|&b| b != 0) {
            return Err(XdrError::Padding);
        }
        Ok(())
    }

    fn get_fixed<const N: usize>(&mut self) -> Result<[u8; N]> {
        let out = self.array::<N>()?;
        self.skip_padding(N)?;
        Ok(out)
    }

    fn get_len(&mut self, what: &'static str, max: usize) -> Result<usize> {
        let len = self.get_u32()? as usize;
        if len > max {
            return Err(XdrError::TooLong { what, len, max });
        }
        Ok(len)
    }

    fn get_var(&mut self, what: &'static str, max: usize) -> Result<Vec<u8>> {
        let len = self.get_len(what, max)?;
        let bytes = self.take(len)?.to_vec();
        self.skip_padding(len)?;
        Ok(bytes)
    }

    fn finish(self) -> Result<()> {
        match self.buf.len() - self.pos {
            0 => Ok(()),
            n => Err(XdrError::TrailingBytes(n)),
        }
    }
}

fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

fn write_account_id(w: &mut XdrWriter, account: &AccountId) {
    w.put_i32(KEY_TYPE_ED25519);
    w.put_fixed(account.as_bytes());
}

fn read_account_id(r: &mut XdrReader<'_>) -> Result<AccountId> {
    match r.get_i32()? {
        KEY_TYPE_ED25519 => Ok(AccountId::from_bytes(r.get_fixed()?)),
        value => Err(XdrError::UnknownDiscriminant {
            kind: "public key",
            value,
        }),
    }
}

fn write_asset(w: &mut XdrWriter, asset: &Asset) {
    match asset {
        Asset::Native => w.put_i32(ASSET_NATIVE),
        Asset::Credit { code, issuer } => {
            match code {
                AssetCode::AlphaNum4(bytes) => {
                    w.put_i32(ASSET_ALPHANUM4);
                    w.put_fixed(bytes);
                }
                AssetCode::AlphaNum12(bytes) => {
                    w.put_i32(ASSET_ALPHANUM12);
                    w.put_fixed(bytes);
                }
            }
            write_account_id(w, issuer);
        }
    }
}

fn read_asset(r: &mut XdrReader<'_>) -> Result<Asset> {
    let code = match r.get_i32()? {
        ASSET_NATIVE => return Ok(Asset::Native),
        ASSET_ALPHANUM4 => AssetCode::AlphaNum4(r.get_fixed()?),
        ASSET_ALPHANUM12 => AssetCode::AlphaNum12(r.get_fixed()?),
        value => return Err(XdrError::UnknownDiscriminant { kind: "asset", value }),
    };
    let issuer = read_account_id(r)?;
    Ok(Asset::Credit { code, issuer })
}

fn write_memo(w: &mut XdrWriter, memo: &MemoDirective) -> Result<()> {
    match memo {
        MemoDirective::None => w.put_i32(MEMO_NONE),
        MemoDirective::Text(text) => {
            w.put_i32(MEMO_TEXT);
            w.put_var("memo text", text, MEMO_TEXT_MAX)?;
        }
        MemoDirective::Id(id) => {
            w.put_i32(MEMO_ID);
            w.put_u64(*id);
        }
        MemoDirective::Hash(hash) => {
            w.put_i32(MEMO_HASH);
            w.put_fixed(hash);
        }
    }
    Ok(())
}

fn read_memo(r: &mut XdrReader<'_>) -> Result<MemoDirective> {
    match r.get_i32()? {
        MEMO_NONE => Ok(MemoDirective::None),
        MEMO_TEXT => {
            let bytes = r.get_var("memo text", MEMO_TEXT_MAX)?;
            Ok(MemoDirective::Text(bytes))
        }
        MEMO_ID => Ok(MemoDirective::Id(r.get_u64()?)),
        MEMO_HASH => Ok(MemoDirective::Hash(r.get_fixed()?)),
        value => Err(XdrError::UnknownDiscriminant { kind: "memo", value }),
    }
}

fn write_operation(w: &mut XdrWriter, op: &Operation) {
    w.put_bool(op.source.is_some());
    if let Some(source) = &op.source {
        write_account_id(w, source);
    }
    match &op.body {
        OperationBody::CreateAccount {
            destination,
            starting_balance,
        } => {
            w.put_i32(OP_CREATE_ACCOUNT);
            write_account_id(w, destination);
            w.put_i64(starting_balance.stroops());
        }
        OperationBody::Payment {
            destination,
            asset,
            amount,
        } => {
            w.put_i32(OP_PAYMENT);
            write_account_id(w, destination);
            write_asset(w, asset);
            w.put_i64(amount.stroops());
        }
    }
}

fn read_operation(r: &mut XdrReader<'_>) -> Result<Operation> {
    let source = if r.get_bool()? {
        Some(read_account_id(r)?)
    } else {
        None
    };
    let body = match r.get_i32()? {
        OP_CREATE_ACCOUNT => OperationBody::CreateAccount {
            destination: read_account_id(r)?,
            starting_balance: Amount::from_stroops(r.get_i64()?),
        },
        OP_PAYMENT => OperationBody::Payment {
            destination: read_account_id(r)?,
            asset: read_asset(r)?,
            amount: Amount::from_stroops(r.get_i64()?),
        },
        value => {
            return Err(XdrError::UnknownDiscriminant {
                kind: "operation",
                value,
            });
        }
    };
    Ok(Operation { source, body })
}

fn write_transaction(w: &mut XdrWriter, tx: &Transaction) -> Result<()> {
    write_account_id(w, &tx.source);
    w.put_u32(tx.fee);
    w.put_i64(tx.sequence);
    w.put_bool(tx.time_bounds.is_some());
    if let Some(bounds) = &tx.time_bounds {
        w.put_u64(bounds.min_time);
        w.put_u64(bounds.max_time);
    }
    write_memo(w, &tx.memo)?;
    w.put_len("operations", tx.operations.len(), MAX_OPERATIONS)?;
    for op in &tx.operations {
        write_operation(w, op);
    }
    // ext
    w.put_i32(0);
    Ok(())
}

fn read_transaction(r: &mut XdrReader<'_>) -> Result<Transaction> {
    let source = read_account_id(r)?;
    let fee = r.get_u32()?;
    let sequence = r.get_i64()?;
    let time_bounds = if r.get_bool()? {
        Some(TimeBounds {
            min_time: r.get_u64()?,
            max_time: r.get_u64()?,
        })
    } else {
        None
    };
    let memo = read_memo(r)?;
    let count = r.get_len("operations", MAX_OPERATIONS)?;
    let operations = (0..count)
        .map(|_| read_operation(r))
        .collect::<Result<Vec<_>>>()?;
    match r.get_i32()? {
        0 => {}
        value => {
            return Err(XdrError::UnknownDiscriminant {
                kind: "transaction ext",
                value,
            });
        }
    }
    Ok(Transaction {
        source,
        fee,
        sequence,
        time_bounds,
        memo,
        operations,
    })
}

pub fn encode_transaction(tx: &Transaction) -> Result<Vec<u8>> {
    let mut w = XdrWriter::default();
    write_transaction(&mut w, tx)?;
    Ok(w.buf)
}

pub fn decode_transaction(bytes: &[u8]) -> Result<Transaction> {
    let mut r = XdrReader::new(bytes);
    let tx = read_transaction(&mut r)?;
    r.finish()?;
    Ok(tx)
}

/// Decodes a base64 transaction such as the one returned by a compliance server.
pub fn decode_transaction_base64(encoded: &str) -> Result<Transaction> {
    decode_transaction(&STANDARD.decode(encoded.trim())?)
}

pub fn encode_envelope(envelope: &TransactionEnvelope) -> Result<Vec<u8>> {
    let mut w = XdrWriter::default();
    write_transaction(&mut w, &envelope.tx)?;
    w.put_len("signatures", envelope.signatures.len(), MAX_SIGNATURES)?;
    for sig in &envelope.signatures {
        w.put_fixed(&sig.hint);
        w.put_var("signature", &sig.signature, MAX_SIGNATURE_LEN)?;
    }
    Ok(w.buf)
}

pub fn encode_envelope_base64(envelope: &TransactionEnvelope) -> Result<String> {
    Ok(STANDARD.encode(encode_envelope(envelope)?))
}

pub fn decode_envelope(bytes: &[u8]) -> Result<TransactionEnvelope> {
    let mut r = XdrReader::new(bytes);
    let tx = read_transaction(&mut r)?;
    let count = r.get_len("signatures", MAX_SIGNATURES)?;
    let mut signatures = Vec::with_capacity(count);
    for _ in 0..count {
        signatures.push(DecoratedSignature {
            hint: r.get_fixed()?,
            signature: r.get_var("signature", MAX_SIGNATURE_LEN)?,
        });
    }
    r.finish()?;
    Ok(TransactionEnvelope { tx, signatures })
}

pub fn decode_envelope_base64(encoded: &str) -> Result<TransactionEnvelope> {
    decode_envelope(&STANDARD.decode(encoded.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::SecretSeed;
    use crate::domain::transaction::NetworkId;

    fn sample_transaction(memo: MemoDirective) -> Transaction {
        Transaction {
            source: AccountId::from_bytes([1; 32]),
            fee: 100,
            sequence: 42,
            time_bounds: None,
            memo,
            operations: vec![Operation {
                source: None,
                body: OperationBody::Payment {
                    destination: AccountId::from_bytes([2; 32]),
                    asset: Asset::Credit {
                        code: AssetCode::new("USD").unwrap(),
                        issuer: AccountId::from_bytes([3; 32]),
                    },
                    amount: Amount::from_stroops(10_000_000),
                },
            }],
        }
    }

    #[test]
    fn test_transaction_layout() {
        let bytes = encode_transaction(&sample_transaction(MemoDirective::Id(7))).unwrap();

        // source: key type + 32 bytes
        assert_eq!(&bytes[0..4], &[0, 0, 0, 0]);
        assert_eq!(&bytes[4..36], &[1; 32]);
        // fee, sequence, no time bounds
        assert_eq!(&bytes[36..40], &100u32.to_be_bytes());
        assert_eq!(&bytes[40..48], &42i64.to_be_bytes());
        assert_eq!(&bytes[48..52], &[0, 0, 0, 0]);
        // memo id
        assert_eq!(&bytes[52..56], &MEMO_ID.to_be_bytes());
        assert_eq!(&bytes[56..64], &7u64.to_be_bytes());
        // one operation without a source, payment body
        assert_eq!(&bytes[64..68], &1u32.to_be_bytes());
        assert_eq!(&bytes[68..72], &[0, 0, 0, 0]);
        assert_eq!(&bytes[72..76], &OP_PAYMENT.to_be_bytes());
        // ext
        assert_eq!(&bytes[bytes.len() - 4..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_text_memo_is_padded() {
        let tx = sample_transaction(MemoDirective::Text(b"hello".to_vec()));
        let decoded = decode_transaction(&encode_transaction(&tx).unwrap()).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn test_overlong_text_memo_is_rejected() {
        let tx = sample_transaction(MemoDirective::Text(vec![b'x'; 29]));
        assert!(matches!(
            encode_transaction(&tx),
            Err(XdrError::TooLong { what: "memo text", .. })
        ));
    }

    #[test]
    fn test_non_utf8_text_memo_round_trips() {
        let tx = sample_transaction(MemoDirective::Text(vec![0xff, 0xfe, b'a', 0x80]));
        let bytes = encode_transaction(&tx).unwrap();
        let decoded = decode_transaction(&bytes).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(encode_transaction(&decoded).unwrap(), bytes);
    }

    #[test]
    fn test_decode_preserves_optional_fields() {
        let mut tx = sample_transaction(MemoDirective::Hash([9; 32]));
        tx.time_bounds = Some(TimeBounds {
            min_time: 1,
            max_time: 2,
        });
        tx.operations[0].source = Some(AccountId::from_bytes([4; 32]));
        let decoded = decode_transaction(&encode_transaction(&tx).unwrap()).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn test_decode_rejects_trailing_bytes_and_truncation() {
        let mut bytes = encode_transaction(&sample_transaction(MemoDirective::None)).unwrap();
        let truncated = &bytes[..bytes.len() - 1];
        assert_eq!(decode_transaction(truncated), Err(XdrError::UnexpectedEof));
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert_eq!(decode_transaction(&bytes), Err(XdrError::TrailingBytes(4)));
    }

    #[test]
    fn test_decode_rejects_unknown_operation() {
        let mut bytes = encode_transaction(&sample_transaction(MemoDirective::None)).unwrap();
        // operation type sits after source(36) fee(4) seq(8) bounds(4) memo(4) count(4) op source(4)
        bytes[64..68].copy_from_slice(&2i32.to_be_bytes());
        assert_eq!(
            decode_transaction(&bytes),
            Err(XdrError::UnknownDiscriminant {
                kind: "operation",
                value: 2
            })
        );
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        assert!(matches!(
            decode_transaction_base64("not base64!"),
            Err(XdrError::Base64(_))
        ));
    }

    #[test]
    fn test_signed_envelope_decodes_and_verifies() {
        use ed25519_dalek::{Signature, Verifier};

        let seed = SecretSeed::from_bytes(&[7; 32]);
        let network = NetworkId::from_passphrase("Test SDF Network ; September 2015");
        let mut tx = sample_transaction(MemoDirective::None);
        tx.source = seed.account_id();

        let envelope = tx.clone().sign(&seed, &network).unwrap();
        let decoded = decode_envelope_base64(&envelope.to_base64().unwrap()).unwrap();
        assert_eq!(decoded, envelope);

        let sig = &decoded.signatures[0];
        assert_eq!(sig.hint, seed.account_id().hint());
        let signature = Signature::from_slice(&sig.signature).unwrap();
        let key = seed.account_id().verifying_key().unwrap();
        assert!(key.verify(&tx.hash(&network).unwrap(), &signature).is_ok());
    }
}
