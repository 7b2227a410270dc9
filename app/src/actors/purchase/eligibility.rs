//! Minter-specific eligibility checks
//!
//! Pure async functions over the collaborator handles: given unchanged
//! allowlist, holdings and allowance inputs they return the same verdict
//! and the same chosen vault or token. The connected wallet is always
//! preferred over a delegated vault when both qualify.

use ethers_core::types::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clients::ClientHandles;
use crate::error::EngineError;
use crate::types::{MinterSpec, ProjectSaleData, TokenId};

/// ERC-20 payment context captured during the eligibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Allowance {
    /// Payment token
    pub token: Address,
    /// Token decimals
    pub decimals: u8,
    /// Allowance currently granted to the minter
    pub allowance: U256,
}

/// Minter-specific data the purchase submission needs later.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EligibilityData {
    /// Delegated vault that qualified, when the wallet itself did not
    pub vault: Option<Address>,
    /// Mints remaining for the chosen address on allowlisted minters
    pub remaining_invocations: Option<u32>,
    /// Qualifying token for holder-gated minters
    pub held_token: Option<TokenId>,
    /// Payment context for ERC-20 minters
    pub erc20: Option<Erc20Allowance>,
}

/// Outcome of an eligibility check. Ineligibility is a normal outcome
/// carrying a human-readable reason, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Eligibility {
    /// The caller may purchase, with the captured minter-specific data
    Eligible(EligibilityData),
    /// The caller may not purchase
    Ineligible {
        /// Why not
        reason: String,
    },
}

/// Run the minter-specific eligibility check for the connected wallet.
pub async fn check(
    clients: ClientHandles,
    project: ProjectSaleData,
) -> Result<Eligibility, EngineError> {
    let Some(account) = clients.account() else {
        return Ok(Eligibility::Ineligible { reason: "no wallet account is connected".into() });
    };
    let Some(minter) = project.minter.clone() else {
        return Ok(Eligibility::Ineligible { reason: "project has no minter configured".into() });
    };

    match minter.spec {
        MinterSpec::SetPrice
        | MinterSpec::DutchAuctionLinear
        | MinterSpec::DutchAuctionExponential => Ok(Eligibility::Eligible(EligibilityData::default())),

        MinterSpec::Merkle { allowlist_uri, .. } => {
            check_merkle(&clients, &project, minter.address, &allowlist_uri, account).await
        }

        MinterSpec::Holder { allowed_collections } => {
            check_holder(&clients, &allowed_collections, account).await
        }

        MinterSpec::Erc20 { token } => {
            let decimals = clients.chain.erc20_decimals(token).await?;
            let allowance = clients.chain.erc20_allowance(token, account, minter.address).await?;
            debug!(?token, %allowance, "erc20 eligibility captured");
            Ok(Eligibility::Eligible(EligibilityData {
                erc20: Some(Erc20Allowance { token, decimals, allowance }),
                ..EligibilityData::default()
            }))
        }

        MinterSpec::RankedAuction { .. } => Ok(Eligibility::Ineligible {
            reason: "ranked-auction projects take bids rather than direct purchases".into(),
        }),

        MinterSpec::Unsupported { type_name } => Ok(Eligibility::Ineligible {
            reason: format!("minter type `{type_name}` is not supported"),
        }),
    }
}

/// Allowlist check across the wallet and its delegated vaults.
///
/// The wallet is tried first; a vault is only chosen when the wallet is
/// absent from the list or out of remaining mints.
async fn check_merkle(
    clients: &ClientHandles,
    project: &ProjectSaleData,
    minter: Address,
    allowlist_uri: &str,
    account: Address,
) -> Result<Eligibility, EngineError> {
    let allowlist = clients.allowlists.fetch(allowlist_uri).await?;
    let vaults = clients.chain.delegated_vaults(account).await?;

    let mut candidates = Vec::with_capacity(vaults.len() + 1);
    candidates.push((account, None));
    candidates.extend(vaults.into_iter().map(|vault| (vault, Some(vault))));

    let mut listed = false;
    for (address, vault) in candidates {
        if !allowlist.contains(&address) {
            continue;
        }
        listed = true;
        let remaining =
            clients.chain.remaining_invocations(&project.project, minter, address).await?;
        if remaining > 0 {
            debug!(?address, ?vault, remaining, "allowlist candidate accepted");
            return Ok(Eligibility::Eligible(EligibilityData {
                vault,
                remaining_invocations: Some(remaining),
                ..EligibilityData::default()
            }));
        }
    }

    let reason = if listed {
        "no remaining mints for any allowlisted address".to_string()
    } else {
        "address is not on the allowlist".to_string()
    };
    Ok(Eligibility::Ineligible { reason })
}

/// Holder check across the wallet and its delegated vaults, preferring
/// direct ownership.
async fn check_holder(
    clients: &ClientHandles,
    collections: &[Address],
    account: Address,
) -> Result<Eligibility, EngineError> {
    let direct = clients.indexer.owned_tokens_in(collections, account).await?;
    if let Some(held) = direct.into_iter().next() {
        return Ok(Eligibility::Eligible(EligibilityData {
            held_token: Some(held),
            ..EligibilityData::default()
        }));
    }

    for vault in clients.chain.delegated_vaults(account).await? {
        let owned = clients.indexer.owned_tokens_in(collections, vault).await?;
        if let Some(held) = owned.into_iter().next() {
            return Ok(Eligibility::Eligible(EligibilityData {
                vault: Some(vault),
                held_token: Some(held),
                ..EligibilityData::default()
            }));
        }
    }

    Ok(Eligibility::Ineligible {
        reason: "wallet does not hold a token from an allowed collection".into(),
    })
}
