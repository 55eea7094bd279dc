//! Balances derived from a chain
//!
//! There is no stored account state. A [`Ledger`] is rebuilt by replaying every
//! transaction of a chain in order, so two nodes holding the same chain always
//! agree on every balance.

use crate::core::{Block, Chain, Transaction};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    balances: HashMap<String, i64>,
}

impl Ledger {
    pub fn from_chain(chain: &Chain) -> Ledger {
        Self::from_blocks(chain.blocks())
    }

    pub fn from_blocks(blocks: &[Block]) -> Ledger {
        let mut ledger = Ledger::default();
        for block in blocks {
            for tx in block.get_transactions() {
                ledger.apply(tx);
            }
        }
        ledger
    }

    fn apply(&mut self, tx: &Transaction) {
        // rewards are minted, not debited from anyone
        if !tx.is_reward() {
            let sender = self.balances.entry(tx.get_sender().to_string()).or_insert(0);
            *sender = sender.saturating_sub(tx.get_amount());
        }
        let recipient = self
            .balances
            .entry(tx.get_recipient().to_string())
            .or_insert(0);
        *recipient = recipient.saturating_add(tx.get_amount());
    }

    pub fn balance(&self, identity: &str) -> i64 {
        self.balances.get(identity).copied().unwrap_or(0)
    }

    /// Identities that appear in the chain, with their balances
    pub fn balances(&self) -> &HashMap<String, i64> {
        &self.balances
    }

    /// Replays `chain` and returns the balance of `identity`
    pub fn balance_of(chain: &Chain, identity: &str) -> i64 {
        Self::from_chain(chain).balance(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Miner;

    const DIFFICULTY: u32 = 2;

    fn chain_with(blocks: Vec<(Vec<Transaction>, &str)>) -> Chain {
        let mut chain = Chain::new(DIFFICULTY);
        let miner = Miner::new(10);
        for (txs, miner_id) in blocks {
            let block = miner.mine_block(&chain, txs, miner_id).unwrap();
            chain.append_block(block).unwrap();
        }
        chain
    }

    #[test]
    fn test_unknown_identity_has_zero_balance() {
        let chain = Chain::new(DIFFICULTY);
        assert_eq!(Ledger::balance_of(&chain, "nobody"), 0);
        assert!(Ledger::from_chain(&chain).balances().is_empty());
    }

    #[test]
    fn test_rewards_credit_miner() {
        let chain = chain_with(vec![(vec![], "alice"), (vec![], "alice")]);
        assert_eq!(Ledger::balance_of(&chain, "alice"), 20);
        // the system sender is never debited
        assert_eq!(Ledger::balance_of(&chain, "system"), 0);
    }

    #[test]
    fn test_transfers_move_balance() {
        let chain = chain_with(vec![
            (vec![], "alice"),
            (vec![Transaction::new("alice", "bob", 4).unwrap()], "carol"),
        ]);
        let ledger = Ledger::from_chain(&chain);
        assert_eq!(ledger.balance("alice"), 6);
        assert_eq!(ledger.balance("bob"), 4);
        assert_eq!(ledger.balance("carol"), 10);
    }

    #[test]
    fn test_replay_is_pure() {
        let chain = chain_with(vec![
            (vec![], "alice"),
            (vec![Transaction::new("alice", "bob", 3).unwrap()], "alice"),
        ]);
        let first = Ledger::from_chain(&chain);
        let second = Ledger::from_chain(&chain);
        assert_eq!(first, second);

        // total supply equals the rewards minted; nothing counted twice
        let total: i64 = first.balances().values().sum();
        assert_eq!(total, 20);
    }
}
