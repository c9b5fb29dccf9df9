use crate::error::PaymentError;

/// The memo attached to a transaction, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MemoDirective {
    #[default]
    None,
    Id(u64),
    /// Raw memo bytes; the ledger does not require them to be UTF-8.
    Text(Vec<u8>),
    Hash([u8; 32]),
}

/// A memo the destination requires every incoming payment to carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MandatedMemo {
    pub memo_type: String,
    pub value: String,
}

/// Reconciles the memo fields supplied by the client with a memo mandated by
/// address resolution.
///
/// The two sources are mutually exclusive: a mandated memo is used only when
/// the client sent none.
pub fn resolve_memo(
    memo_type: Option<&str>,
    memo: Option<&str>,
    mandated: Option<&MandatedMemo>,
) -> Result<MemoDirective, PaymentError> {
    let client = match (memo_type, memo) {
        (None, None) => None,
        (Some(memo_type), Some(memo)) => Some((memo_type, memo)),
        _ => return Err(PaymentError::MissingMemoParameter),
    };

    let (memo_type, value) = match (client, mandated) {
        (Some(_), Some(_)) => return Err(PaymentError::ConflictingMemo),
        (Some(client), None) => client,
        (None, Some(mandated)) => (mandated.memo_type.as_str(), mandated.value.as_str()),
        (None, None) => return Ok(MemoDirective::None),
    };

    parse_memo(memo_type, value)
}

fn parse_memo(memo_type: &str, value: &str) -> Result<MemoDirective, PaymentError> {
    match memo_type {
        "id" => {
            // `u64::from_str` tolerates a leading '+', the wire format does not.
            if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(PaymentError::InvalidMemo);
            }
            value
                .parse::<u64>()
                .map(MemoDirective::Id)
                .map_err(|_| PaymentError::InvalidMemo)
        }
        "text" => Ok(MemoDirective::Text(value.as_bytes().to_vec())),
        "hash" => {
            let bytes = hex::decode(value).map_err(|_| PaymentError::InvalidMemo)?;
            let hash: [u8; 32] = bytes.try_into().map_err(|_| PaymentError::InvalidMemo)?;
            Ok(MemoDirective::Hash(hash))
        }
        _ => Err(PaymentError::UnsupportedMemoType),
    }
}
