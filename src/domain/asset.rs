use super::account::AccountId;
use super::transaction::BuildError;
use crate::error::PaymentError;

/// Which asset a payment moves, as requested by the client.
///
/// A credit asset always carries both its code and its issuer; a request that
/// names only one of them never reaches this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSpecifier {
    Native,
    Credit { code: String, issuer: AccountId },
}

impl AssetSpecifier {
    /// Builds a specifier from the raw `asset_code` / `asset_issuer` form fields.
    ///
    /// The code itself is not validated here; a malformed code is a construction
    /// failure reported by the assembler.
    pub fn from_params(code: Option<&str>, issuer: Option<&str>) -> Result<Self, PaymentError> {
        match (code, issuer) {
            (None, None) => Ok(Self::Native),
            (Some(code), Some(issuer)) => {
                let issuer = AccountId::parse(issuer).map_err(|_| PaymentError::InvalidIssuer)?;
                Ok(Self::Credit {
                    code: code.to_string(),
                    issuer,
                })
            }
            _ => Err(PaymentError::MissingAssetParameter),
        }
    }
}

/// A validated credit asset code, padded into its fixed-width ledger form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCode {
    AlphaNum4([u8; 4]),
    AlphaNum12([u8; 12]),
}

impl AssetCode {
    pub fn new(code: &str) -> Result<Self, BuildError> {
        if code.is_empty() || code.len() > 12 {
            return Err(BuildError::AssetCodeLength);
        }
        if !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(BuildError::AssetCodeCharset);
        }
        if code.len() <= 4 {
            let mut buf = [0u8; 4];
            buf[..code.len()].copy_from_slice(code.as_bytes());
            Ok(Self::AlphaNum4(buf))
        } else {
            let mut buf = [0u8; 12];
            buf[..code.len()].copy_from_slice(code.as_bytes());
            Ok(Self::AlphaNum12(buf))
        }
    }

    /// The code with trailing padding stripped.
    pub fn as_str(&self) -> &str {
        let bytes: &[u8] = match self {
            Self::AlphaNum4(b) => b,
            Self::AlphaNum12(b) => b,
        };
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        std::str::from_utf8(&bytes[..end]).unwrap_or_default()
    }
}

/// An asset as it appears inside a ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asset {
    Native,
    Credit { code: AssetCode, issuer: AccountId },
}

impl TryFrom<&AssetSpecifier> for Asset {
    type Error = BuildError;

    fn try_from(spec: &AssetSpecifier) -> Result<Self, Self::Error> {
        match spec {
            AssetSpecifier::Native => Ok(Self::Native),
            AssetSpecifier::Credit { code, issuer } => Ok(Self::Credit {
                code: AssetCode::new(code)?,
                issuer: *issuer,
            }),
        }
    }
}
