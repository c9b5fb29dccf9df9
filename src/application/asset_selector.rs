use super::cancel::Cancellation;
use crate::domain::account::AccountId;
use crate::domain::asset::AssetSpecifier;
use crate::domain::ports::{LedgerError, LedgerQuery};
use crate::domain::transaction::OperationIntent;
use crate::error::{PaymentError, Result};
use tracing::{error, info};

/// Decides which operation carries the payment.
///
/// Credit assets always use a plain payment. Native payments to an account the
/// ledger does not know yet become an account creation, because a missing
/// account cannot receive a plain payment.
pub async fn select_operation(
    ledger: &dyn LedgerQuery,
    asset_code: Option<&str>,
    asset_issuer: Option<&str>,
    destination: &AccountId,
    amount: &str,
    cancel: &Cancellation,
) -> Result<OperationIntent> {
    let asset = AssetSpecifier::from_params(asset_code, asset_issuer).inspect_err(|err| {
        info!(?asset_code, ?asset_issuer, error = %err, "Invalid asset parameters");
    })?;

    if let AssetSpecifier::Credit { .. } = asset {
        return Ok(OperationIntent::Payment {
            destination: *destination,
            amount: amount.to_string(),
            asset,
        });
    }

    match cancel.guard(ledger.load_account(destination)).await? {
        Ok(_) => Ok(OperationIntent::Payment {
            destination: *destination,
            amount: amount.to_string(),
            asset: AssetSpecifier::Native,
        }),
        Err(LedgerError::NotFound) => {
            info!(%destination, "Destination does not exist, funding it with create_account");
            Ok(OperationIntent::CreateAccount {
                destination: *destination,
                amount: amount.to_string(),
            })
        }
        Err(err) => {
            error!(%destination, error = %err, "Error loading destination account");
            Err(PaymentError::ServerError)
        }
    }
}
