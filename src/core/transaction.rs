// A transfer of value between two identities. There are no signatures and no
// UTXOs here: balances are derived by replaying the chain (see ledger.rs), so a
// transaction only has to name who pays, who is paid and how much.

use crate::error::{BlockchainError, Result};
use serde::{Deserialize, Serialize};

/// Sender used for mining rewards; exempt from balance checks
pub const SYSTEM_SENDER: &str = "system";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, bincode::Encode)]
pub struct Transaction {
    sender: String,
    recipient: String,
    amount: i64,
}

impl Transaction {
    /// A user-submitted transfer
    pub fn new(sender: &str, recipient: &str, amount: i64) -> Result<Transaction> {
        if amount <= 0 {
            return Err(BlockchainError::InvalidTransaction(format!(
                "amount must be positive, got {amount}"
            )));
        }
        if sender.is_empty() || recipient.is_empty() {
            return Err(BlockchainError::InvalidTransaction(
                "sender and recipient must not be empty".to_string(),
            ));
        }
        if sender == recipient {
            return Err(BlockchainError::InvalidTransaction(format!(
                "sender and recipient are both {sender}"
            )));
        }

        Ok(Transaction {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            amount,
        })
    }

    /// The reward transaction appended to every mined block
    pub fn reward(miner: &str, amount: i64) -> Result<Transaction> {
        if miner.is_empty() || miner == SYSTEM_SENDER {
            return Err(BlockchainError::InvalidTransaction(format!(
                "invalid miner identity '{miner}'"
            )));
        }
        if amount <= 0 {
            return Err(BlockchainError::InvalidTransaction(format!(
                "mining reward must be positive, got {amount}"
            )));
        }

        Ok(Transaction {
            sender: SYSTEM_SENDER.to_string(),
            recipient: miner.to_string(),
            amount,
        })
    }

    pub fn get_sender(&self) -> &str {
        self.sender.as_str()
    }

    pub fn get_recipient(&self) -> &str {
        self.recipient.as_str()
    }

    pub fn get_amount(&self) -> i64 {
        self.amount
    }

    pub fn is_reward(&self) -> bool {
        self.sender == SYSTEM_SENDER
    }

    /// Checks applied to every transaction embedded in a block, including
    /// ones received from peers
    pub fn is_well_formed(&self) -> bool {
        self.amount >= 0 && !self.sender.is_empty() && !self.recipient.is_empty()
    }
}
