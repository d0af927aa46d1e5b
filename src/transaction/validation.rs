use crate::error::ChainError;
use super::types::Transaction;

impl Transaction {
    /// Reject amounts that have no canonical JSON form.
    ///
    /// Sign and balance are deliberately left unchecked: the ledger does no
    /// account accounting.
    pub fn validate(&self) -> Result<(), ChainError> {
        if !self.amount.is_finite() {
            return Err(ChainError::InvalidTransaction(format!(
                "Amount must be a finite number, got {}",
                self.amount
            )));
        }
        Ok(())
    }
}
