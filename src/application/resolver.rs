use super::cancel::Cancellation;
use crate::domain::account::AccountId;
use crate::domain::memo::MandatedMemo;
use crate::domain::payment::ResolvedDestination;
use crate::domain::ports::NamingResolver;
use crate::error::{PaymentError, Result};
use tracing::info;

/// Resolves the destination identifier and validates the account it maps to.
pub async fn resolve_destination(
    naming: &dyn NamingResolver,
    identifier: &str,
    cancel: &Cancellation,
) -> Result<ResolvedDestination> {
    let record = cancel
        .guard(naming.resolve(identifier))
        .await?
        .map_err(|err| {
            info!(destination = identifier, error = %err, "Cannot resolve address");
            PaymentError::UnresolvableDestination
        })?;

    let account_id = AccountId::parse(&record.account_id).map_err(|err| {
        info!(account_id = %record.account_id, error = %err, "Invalid account id in destination");
        PaymentError::InvalidResolvedAccount
    })?;

    let mandated_memo = record
        .memo_type
        .filter(|memo_type| !memo_type.is_empty())
        .map(|memo_type| MandatedMemo {
            memo_type,
            value: record.memo.unwrap_or_default(),
        });

    Ok(ResolvedDestination {
        account_id,
        mandated_memo,
    })
}
