/// Transaction types for the ledger
use sha2::{Digest, Sha256};

/// Opaque account identifier. Existence and ownership are never checked.
pub type Identifier = String;

/// A transfer of `amount` from `sender` to `recipient`.
///
/// Mutable only while pending; once sealed into a block it is owned by that
/// block and never changes again.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    pub sender: Identifier,
    pub recipient: Identifier,
    pub amount: f64,
}

impl Transaction {
    pub fn new(sender: impl Into<Identifier>, recipient: impl Into<Identifier>, amount: f64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// Feed the canonical encoding of this transaction into `hasher`.
    ///
    /// Strings are length-prefixed so `("ab", "c")` and `("a", "bc")` never
    /// collide; the amount is encoded by its IEEE-754 bit pattern.
    pub fn update_hasher(&self, hasher: &mut Sha256) {
        hasher.update((self.sender.len() as u64).to_le_bytes());
        hasher.update(self.sender.as_bytes());
        hasher.update((self.recipient.len() as u64).to_le_bytes());
        hasher.update(self.recipient.as_bytes());
        hasher.update(self.amount.to_bits().to_le_bytes());
    }
}
