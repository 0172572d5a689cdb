//! Reconciliation of access-control roles toward a desired end state

use std::time::Duration;

use alloy_sol_types::SolCall;
use tracing::{info, warn};

use crate::{
    chain::{await_receipt, call_and_decode, ChainClient},
    errors::ScriptError,
    solidity::IAccessControl::{grantRoleCall, hasRoleCall, revokeRoleCall},
    types::{RoleGrant, RoleGrantResult, RoleGrantStatus},
};

/// Grants and revokes roles on deployed contracts, verifying each change
pub struct RoleProvisioner<'a> {
    /// The client transactions are sent through
    client: &'a dyn ChainClient,
    /// How long to wait for each grant or revoke to confirm
    confirmation_timeout: Duration,
}

impl<'a> RoleProvisioner<'a> {
    /// Create a provisioner sending through `client`
    pub fn new(client: &'a dyn ChainClient, confirmation_timeout: Duration) -> Self {
        Self {
            client,
            confirmation_timeout,
        }
    }

    /// Reconcile each grant in order
    ///
    /// Grants are independent: a grant that fails or does not verify is
    /// reported in its result and the remaining grants are still processed.
    pub async fn reconcile(&self, grants: &[RoleGrant]) -> Vec<RoleGrantResult> {
        let mut results = Vec::with_capacity(grants.len());
        for grant in grants {
            let status = match self.reconcile_grant(grant).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(grant = %grant, error = %e, "failed to reconcile role");
                    RoleGrantStatus::Failed(e)
                }
            };

            results.push(RoleGrantResult {
                grant: grant.clone(),
                status,
            });
        }

        results
    }

    /// Whether the grantee currently holds the role
    pub async fn has_role(&self, grant: &RoleGrant) -> Result<bool, ScriptError> {
        let calldata = hasRoleCall {
            role: grant.role.id(),
            account: grant.grantee,
        }
        .abi_encode();

        call_and_decode::<bool>(self.client, grant.contract, calldata).await
    }

    /// Bring a single grant's on-chain state in line with its intent
    async fn reconcile_grant(&self, grant: &RoleGrant) -> Result<RoleGrantStatus, ScriptError> {
        if self.has_role(grant).await? == grant.granted {
            info!(grant = %grant, "role already in desired state");
            return Ok(RoleGrantStatus::Unchanged);
        }

        let role = grant.role.id();
        let account = grant.grantee;
        let calldata = if grant.granted {
            grantRoleCall { role, account }.abi_encode()
        } else {
            revokeRoleCall { role, account }.abi_encode()
        };

        let tx = self
            .client
            .send_transaction(grant.contract, calldata.into())
            .await?;
        await_receipt(self.client, tx, self.confirmation_timeout).await?;

        // The transaction may confirm while a concurrent change supersedes it
        if self.has_role(grant).await? != grant.granted {
            warn!(grant = %grant, tx = %tx.tx_hash, "role change confirmed but not in effect");
            return Ok(RoleGrantStatus::VerificationFailed);
        }

        info!(grant = %grant, tx = %tx.tx_hash, "role change applied");
        Ok(RoleGrantStatus::Applied)
    }
}

/// The error describing the first grant whose intended state does not hold
pub fn first_failure(results: &[RoleGrantResult]) -> Option<ScriptError> {
    results.iter().find(|r| !r.holds()).map(|r| match &r.status {
        RoleGrantStatus::Failed(e) => e.clone(),
        _ => ScriptError::VerificationFailed(r.grant.to_string()),
    })
}
