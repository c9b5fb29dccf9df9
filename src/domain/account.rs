use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const VERSION_ACCOUNT_ID: u8 = 6 << 3;
const VERSION_SEED: u8 = 18 << 3;
/// Version byte + 32 key bytes + 2 checksum bytes, base32 without padding.
const STRKEY_LEN: usize = 56;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("strkey must be {STRKEY_LEN} characters, got {0}")]
    Length(usize),
    #[error("strkey contains characters outside the base32 alphabet")]
    Alphabet,
    #[error("unexpected version byte {0:#04x}")]
    Version(u8),
    #[error("strkey checksum mismatch")]
    Checksum,
    #[error("not a valid ed25519 public key")]
    Curve,
}

/// CRC16-XModem, the checksum appended to every strkey.
fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn encode_strkey(version: u8, key: &[u8; 32]) -> String {
    let mut raw = Vec::with_capacity(35);
    raw.push(version);
    raw.extend_from_slice(key);
    let checksum = crc16(&raw);
    raw.extend_from_slice(&checksum.to_le_bytes());
    base32::encode(base32::Alphabet::RFC4648 { padding: false }, &raw)
}

fn decode_strkey(expected_version: u8, encoded: &str) -> Result<[u8; 32], KeyError> {
    if encoded.len() != STRKEY_LEN {
        return Err(KeyError::Length(encoded.len()));
    }
    if !encoded
        .bytes()
        .all(|c| c.is_ascii_uppercase() || (b'2'..=b'7').contains(&c))
    {
        return Err(KeyError::Alphabet);
    }
    let raw = base32::decode(base32::Alphabet::RFC4648 { padding: false }, encoded)
        .ok_or(KeyError::Alphabet)?;
    if raw.len() != 35 {
        return Err(KeyError::Length(encoded.len()));
    }
    if raw[0] != expected_version {
        return Err(KeyError::Version(raw[0]));
    }
    let (body, checksum) = raw.split_at(33);
    if crc16(body).to_le_bytes() != checksum {
        return Err(KeyError::Checksum);
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&body[1..]);
    Ok(key)
}

/// A ledger account identifier: an ed25519 public key in `G...` strkey form.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId([u8; 32]);

impl AccountId {
    /// Parses and validates a `G...` address.
    pub fn parse(address: &str) -> Result<Self, KeyError> {
        decode_strkey(VERSION_ACCOUNT_ID, address).map(Self)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Last four bytes of the key, used as the signature hint.
    pub fn hint(&self) -> [u8; 4] {
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&self.0[28..]);
        hint
    }

    pub fn verifying_key(&self) -> Result<VerifyingKey, KeyError> {
        VerifyingKey::from_bytes(&self.0).map_err(|_| KeyError::Curve)
    }
}

impl FromStr for AccountId {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_strkey(VERSION_ACCOUNT_ID, &self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({self})")
    }
}

/// A signing secret in `S...` strkey form.
///
/// The seed bytes never appear in `Debug` output so request logging cannot leak them.
#[derive(Clone)]
pub struct SecretSeed {
    signing_key: SigningKey,
}

impl SecretSeed {
    pub fn parse(seed: &str) -> Result<Self, KeyError> {
        let bytes = decode_strkey(VERSION_SEED, seed)?;
        Ok(Self::from_bytes(&bytes))
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    /// The public address controlled by this seed.
    pub fn account_id(&self) -> AccountId {
        AccountId(self.signing_key.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Renders the seed back to `S...` form.
    pub fn to_strkey(&self) -> String {
        encode_strkey(VERSION_SEED, &self.signing_key.to_bytes())
    }
}

impl fmt::Debug for SecretSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretSeed")
            .field("account_id", &self.account_id())
            .finish_non_exhaustive()
    }
}

/// Snapshot of an account as currently known to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountState {
    pub account_id: AccountId,
    /// Sequence number of the last transaction applied for this account.
    pub sequence: i64,
}

impl AccountState {
    /// Sequence number the next transaction from this account must carry.
    pub fn next_sequence(&self) -> Option<i64> {
        self.sequence.checked_add(1)
    }
}
