//! Minter-specific purchase submission
//!
//! One arm per minter family; the match is the dispatch table. Merkle
//! proofs are regenerated here at submit time rather than reused from the
//! eligibility check, since the list may have been republished in between.

use ethers_core::types::{Address, H256, U256};
use tracing::debug;

use crate::actors::purchase::eligibility::EligibilityData;
use crate::clients::{ClientHandles, ContractCall};
use crate::error::EngineError;
use crate::types::{MinterSpec, ProjectSaleData};

/// Inputs to one purchase submission.
#[derive(Debug, Clone)]
pub struct SubmitInputs {
    /// Connected wallet account (signer)
    pub account: Address,
    /// Token recipient
    pub to: Address,
    /// Price paid per token
    pub value: U256,
    /// Minter-specific data from the eligibility check
    pub eligibility: EligibilityData,
}

/// Dispatch the purchase to the minter family and return the tx hash.
pub async fn submit_purchase(
    clients: ClientHandles,
    project: ProjectSaleData,
    inputs: SubmitInputs,
) -> Result<H256, EngineError> {
    let minter = project.minter.as_ref().ok_or(EngineError::NoMinter)?;
    let SubmitInputs { account, to, value, eligibility } = inputs;

    let call = match &minter.spec {
        MinterSpec::SetPrice
        | MinterSpec::DutchAuctionLinear
        | MinterSpec::DutchAuctionExponential => ContractCall::Purchase {
            minter: minter.address,
            project: project.project,
            to,
            value,
        },

        MinterSpec::Merkle { merkle_root, allowlist_uri } => {
            // prove the allowlisted address, not the recipient
            let subject = eligibility.vault.unwrap_or(account);
            let proof =
                clients.allowlists.proof_for(allowlist_uri, *merkle_root, subject).await?;
            debug!(?subject, proof_len = proof.len(), "merkle proof regenerated");
            ContractCall::PurchaseMerkle {
                minter: minter.address,
                project: project.project,
                to,
                proof,
                vault: eligibility.vault,
                value,
            }
        }

        MinterSpec::Holder { .. } => {
            let held = eligibility.held_token.ok_or(EngineError::IncompleteEligibility)?;
            ContractCall::PurchaseHolder {
                minter: minter.address,
                project: project.project,
                to,
                held,
                vault: eligibility.vault,
                value,
            }
        }

        MinterSpec::Erc20 { token } => ContractCall::PurchaseErc20 {
            minter: minter.address,
            project: project.project,
            to,
            max_price: value,
            currency: *token,
        },

        MinterSpec::RankedAuction { .. } | MinterSpec::Unsupported { .. } => {
            return Err(EngineError::UnsupportedMinter(minter.spec.name().into()));
        }
    };

    Ok(clients.wallet.submit(call).await?)
}
