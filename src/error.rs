use thiserror::Error;

/// Caller-facing outcome of a failed payment submission.
///
/// Every collaborator or construction failure is translated into exactly one of
/// these kinds before it leaves the application layer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Invalid source parameter")]
    InvalidSource,
    #[error("Cannot resolve destination")]
    UnresolvableDestination,
    #[error("Resolved destination is not a valid account id")]
    InvalidResolvedAccount,
    #[error("Missing one of asset_code or asset_issuer")]
    MissingAssetParameter,
    #[error("Invalid asset_issuer parameter")]
    InvalidIssuer,
    #[error("Missing one of memo_type or memo")]
    MissingMemoParameter,
    #[error("Memo given in request but destination mandates its own memo")]
    ConflictingMemo,
    #[error("Invalid memo value")]
    InvalidMemo,
    #[error("Unsupported memo type")]
    UnsupportedMemoType,
    #[error("Asset code is malformed")]
    MalformedAssetCode,
    #[error("Invalid amount")]
    InvalidAmount,
    #[error("Source account does not exist")]
    SourceAccountNotFound,
    #[error("Internal server error")]
    ServerError,
    #[error("Request canceled")]
    Canceled,
}

impl PaymentError {
    /// Stable machine-readable code used in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSource => "invalid_source",
            Self::UnresolvableDestination => "cannot_resolve_destination",
            Self::InvalidResolvedAccount => "invalid_destination",
            Self::MissingAssetParameter => "asset_missing_param",
            Self::InvalidIssuer => "invalid_issuer",
            Self::MissingMemoParameter => "memo_missing_param",
            Self::ConflictingMemo => "cannot_use_memo",
            Self::InvalidMemo => "invalid_memo",
            Self::UnsupportedMemoType => "unsupported_memo_type",
            Self::MalformedAssetCode => "malformed_asset_code",
            Self::InvalidAmount => "invalid_amount",
            Self::SourceAccountNotFound => "source_not_exist",
            Self::ServerError => "server_error",
            Self::Canceled => "canceled",
        }
    }

    /// Whether the client can fix the request and try again.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::ServerError | Self::Canceled)
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
