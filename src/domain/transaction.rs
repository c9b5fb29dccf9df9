use super::account::{AccountId, SecretSeed};
use super::asset::{Asset, AssetSpecifier};
use super::memo::MemoDirective;
use crate::xdr::{self, XdrError};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of decimal places the ledger tracks for every asset.
pub const AMOUNT_SCALE: u32 = 7;
/// Maximum length of a text memo in bytes.
pub const MEMO_TEXT_MAX: usize = 28;

/// Failures raised while turning validated intents into ledger structures.
///
/// These are never shown to callers directly; the error classifier maps them
/// onto the caller-facing taxonomy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Asset code length is invalid")]
    AssetCodeLength,
    #[error("Asset code must be alphanumeric")]
    AssetCodeCharset,
    #[error("cannot parse amount: {0}")]
    InvalidAmount(String),
    #[error("memo text is longer than {MEMO_TEXT_MAX} bytes")]
    MemoTextTooLong,
    #[error("sequence number overflow")]
    SequenceOverflow,
    #[error("fee overflow")]
    FeeOverflow,
}

/// Rewrites `digits[.digits]` with trailing fractional zeros dropped, or
/// returns `None` when the text has any other shape or more than
/// [`AMOUNT_SCALE`] significant fractional digits.
fn canonical_amount(value: &str) -> Option<String> {
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) if !fraction.is_empty() => (whole, fraction),
        Some(_) => return None,
        None => (value, ""),
    };
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !digits(whole) || !digits(fraction) {
        return None;
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > AMOUNT_SCALE as usize {
        return None;
    }
    Some(if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    })
}

/// A positive amount expressed in stroops (10^-7 units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(i64);

impl Amount {
    /// Parses a decimal amount string such as `"12.5"`.
    ///
    /// Only plain ASCII digits with an optional fractional part are accepted.
    /// Fractional digits past the seventh must all be zero.
    pub fn parse(value: &str) -> Result<Self, BuildError> {
        let invalid = || BuildError::InvalidAmount(value.to_string());

        let canonical = canonical_amount(value.trim()).ok_or_else(invalid)?;
        let decimal = Decimal::from_str(&canonical).map_err(|_| invalid())?;
        if decimal <= Decimal::ZERO {
            return Err(invalid());
        }
        let stroops = decimal
            .checked_mul(Decimal::new(10_i64.pow(AMOUNT_SCALE), 0))
            .and_then(|d| d.to_i64())
            .ok_or_else(invalid)?;
        Ok(Self(stroops))
    }

    pub fn from_stroops(stroops: i64) -> Self {
        Self(stroops)
    }

    pub fn stroops(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Decimal::new(self.0, AMOUNT_SCALE))
    }
}

/// What the payment should do on the ledger, decided before any construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationIntent {
    /// Fund a destination account that does not exist yet.
    CreateAccount {
        destination: AccountId,
        amount: String,
    },
    Payment {
        destination: AccountId,
        amount: String,
        asset: AssetSpecifier,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationBody {
    CreateAccount {
        destination: AccountId,
        starting_balance: Amount,
    },
    Payment {
        destination: AccountId,
        asset: Asset,
        amount: Amount,
    },
}

/// A single ledger operation. `source` overrides the transaction source when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub source: Option<AccountId>,
    pub body: OperationBody,
}

impl TryFrom<OperationIntent> for Operation {
    type Error = BuildError;

    fn try_from(intent: OperationIntent) -> Result<Self, Self::Error> {
        let body = match intent {
            OperationIntent::CreateAccount {
                destination,
                amount,
            } => OperationBody::CreateAccount {
                destination,
                starting_balance: Amount::parse(&amount)?,
            },
            OperationIntent::Payment {
                destination,
                amount,
                asset,
            } => {
                let asset = Asset::try_from(&asset)?;
                OperationBody::Payment {
                    destination,
                    asset,
                    amount: Amount::parse(&amount)?,
                }
            }
        };
        Ok(Self { source: None, body })
    }
}

/// Identifies the network a transaction is valid on: SHA-256 of its passphrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkId([u8; 32]);

impl NetworkId {
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self(Sha256::digest(passphrase.as_bytes()).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub source: AccountId,
    pub fee: u32,
    pub sequence: i64,
    pub time_bounds: Option<TimeBounds>,
    pub memo: MemoDirective,
    pub operations: Vec<Operation>,
}

impl Transaction {
    /// Bytes covered by signatures: network id, envelope type tag and the
    /// transaction itself.
    pub fn signature_base(&self, network: &NetworkId) -> Result<Vec<u8>, XdrError> {
        let mut base = Vec::with_capacity(256);
        base.extend_from_slice(network.as_bytes());
        base.extend_from_slice(&xdr::ENVELOPE_TYPE_TX.to_be_bytes());
        base.extend_from_slice(&xdr::encode_transaction(self)?);
        Ok(base)
    }

    pub fn hash(&self, network: &NetworkId) -> Result<[u8; 32], XdrError> {
        Ok(Sha256::digest(self.signature_base(network)?).into())
    }

    /// Consumes the transaction and produces an envelope carrying one signature.
    pub fn sign(self, seed: &SecretSeed, network: &NetworkId) -> Result<TransactionEnvelope, XdrError> {
        let hash = self.hash(network)?;
        let signature = DecoratedSignature {
            hint: seed.account_id().hint(),
            signature: seed.sign(&hash).to_vec(),
        };
        Ok(TransactionEnvelope {
            tx: self,
            signatures: vec![signature],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedSignature {
    pub hint: [u8; 4],
    pub signature: Vec<u8>,
}

/// A transaction plus its signatures, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEnvelope {
    pub tx: Transaction,
    pub signatures: Vec<DecoratedSignature>,
}

impl TransactionEnvelope {
    pub fn to_base64(&self) -> Result<String, XdrError> {
        xdr::encode_envelope_base64(self)
    }
}
