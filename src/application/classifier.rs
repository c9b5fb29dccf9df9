//! Single mapping point from construction failures to caller-facing kinds.

use crate::domain::transaction::BuildError;
use crate::error::PaymentError;

pub fn classify(err: &BuildError) -> PaymentError {
    match err {
        BuildError::AssetCodeLength | BuildError::AssetCodeCharset => {
            PaymentError::MalformedAssetCode
        }
        BuildError::InvalidAmount(_) => PaymentError::InvalidAmount,
        BuildError::MemoTextTooLong => PaymentError::InvalidMemo,
        BuildError::SequenceOverflow | BuildError::FeeOverflow => PaymentError::ServerError,
    }
}
