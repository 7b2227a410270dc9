//! Minted tokens and settlement receipts

use ethers_core::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::types::ProjectRef;

/// Identity of a token on a core contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId {
    /// Core contract the token lives on
    pub contract: Address,
    /// Token number within the contract
    pub token_number: U256,
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}-{}", self.contract, self.token_number)
    }
}

/// A token record as reflected by the off-chain index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MintedToken {
    /// Token identity
    pub token: TokenId,
    /// Current owner
    pub owner: Address,
    /// Invocation number within the project
    pub invocation: u64,
}

/// Excess settlement funds owed to a bidder after a ranked auction
/// settles below their bid value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// Minter holding the funds
    pub minter: Address,
    /// Project the auction belonged to
    pub project: ProjectRef,
    /// Bidder the excess is owed to
    pub bidder: Address,
    /// Claimable amount
    pub excess: U256,
}

impl SettlementReceipt {
    /// Stable registry key for this receipt.
    pub fn key(&self) -> String {
        format!("{:?}-{}-{:?}", self.minter, self.project, self.bidder)
    }
}
