use crate::transaction::Transaction;

/// Transactions accepted but not yet sealed into a block, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PendingPool {
    transactions: Vec<Transaction>,
}

impl PendingPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    /// Drain the pool for sealing. Anything pushed afterwards belongs to the
    /// next block.
    pub fn take(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_preserves_order_and_clears() {
        let mut pool = PendingPool::new();
        pool.push(Transaction::new("a", "b", 1.0));
        pool.push(Transaction::new("b", "c", 2.0));

        let taken = pool.take();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].sender, "a");
        assert_eq!(taken[1].sender, "b");
        assert!(pool.is_empty());

        pool.push(Transaction::new("c", "d", 3.0));
        assert_eq!(pool.len(), 1);
    }
}
