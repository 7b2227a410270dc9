//! Purchase initiation orchestrator
//!
//! Drives one user's purchase attempt: eligibility check, sale-start gate,
//! optional ERC-20 approval, minter-specific submission, hand-off to the
//! tracking manager. Ineligibility is a normal outcome with a reason;
//! a declined wallet prompt returns to the ready state; `ResetPurchase`
//! clears the attempt and starts over.

pub mod actor;
pub mod eligibility;
pub mod messages;
pub mod minters;

pub use actor::PurchaseActor;
pub use eligibility::{Eligibility, EligibilityData, Erc20Allowance};
pub use messages::*;

#[cfg(test)]
mod tests;
