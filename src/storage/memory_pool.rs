use crate::core::Transaction;

/// Pending transactions in submission order. The pool has no lock of its own:
/// it only ever lives inside the node state, next to the chain it was
/// validated against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionPool {
    inner: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> TransactionPool {
        TransactionPool { inner: Vec::new() }
    }

    pub fn add(&mut self, tx: Transaction) {
        self.inner.push(tx);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get_all(&self) -> Vec<Transaction> {
        self.inner.clone()
    }

    /// Sum of amounts `sender` has queued but not yet seen mined
    pub fn pending_outgoing(&self, sender: &str) -> i64 {
        self.inner
            .iter()
            .filter(|tx| !tx.is_reward() && tx.get_sender() == sender)
            .fold(0i64, |total, tx| total.saturating_add(tx.get_amount()))
    }

    /// Removes one pending entry per transaction in `included`, oldest first.
    /// Identical transfers are distinct payments, so each mined copy only
    /// accounts for one queued copy. Returns how many entries were removed.
    pub fn remove_included(&mut self, included: &[Transaction]) -> usize {
        let before = self.inner.len();
        for tx in included {
            if let Some(idx) = self.inner.iter().position(|pending| pending == tx) {
                self.inner.remove(idx);
            }
        }
        before - self.inner.len()
    }
}
