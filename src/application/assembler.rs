use crate::domain::account::{AccountId, AccountState};
use crate::domain::memo::MemoDirective;
use crate::domain::transaction::{
    BuildError, MEMO_TEXT_MAX, NetworkId, Operation, OperationIntent, Transaction,
};

/// Builds single-operation transactions for one network.
#[derive(Debug, Clone)]
pub struct TransactionAssembler {
    network: NetworkId,
    base_fee: u32,
}

impl TransactionAssembler {
    pub fn new(network_passphrase: &str, base_fee: u32) -> Self {
        Self {
            network: NetworkId::from_passphrase(network_passphrase),
            base_fee,
        }
    }

    pub fn network(&self) -> &NetworkId {
        &self.network
    }

    /// Assembles the transaction. The sequence number is taken from the
    /// snapshot exactly once: `snapshot + 1`.
    pub fn assemble(
        &self,
        source: AccountId,
        snapshot: &AccountState,
        intent: OperationIntent,
        memo: MemoDirective,
    ) -> Result<Transaction, BuildError> {
        let operations = vec![Operation::try_from(intent)?];

        if let MemoDirective::Text(text) = &memo
            && text.len() > MEMO_TEXT_MAX
        {
            return Err(BuildError::MemoTextTooLong);
        }

        let sequence = snapshot
            .next_sequence()
            .ok_or(BuildError::SequenceOverflow)?;
        let fee = u32::try_from(operations.len())
            .ok()
            .and_then(|count| self.base_fee.checked_mul(count))
            .ok_or(BuildError::FeeOverflow)?;

        Ok(Transaction {
            source,
            fee,
            sequence,
            time_bounds: None,
            memo,
            operations,
        })
    }
}
