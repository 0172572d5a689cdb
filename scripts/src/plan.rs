//! Declarative deployment plans
//!
//! A plan is an ordered list of named steps, each declaring the steps it
//! depends on. Plans describe *what* to deploy; the
//! [`Orchestrator`](crate::orchestrator::Orchestrator) decides how to
//! execute them safely.

use std::collections::{HashMap, HashSet};

use alloy::dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{
    errors::ScriptError,
    types::{NetworkId, Role},
};

/// A constructor argument for a deploy step
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ConstructorArg {
    /// A fixed address
    Address(Address),
    /// The address deployed by the named dependency
    Contract(String),
    /// A `uint256`
    Uint(U256),
    /// A `string`
    String(String),
}

impl ConstructorArg {
    /// Resolve the argument into an ABI value, looking up contract references in `resolved`
    pub fn resolve(
        &self,
        resolved: &HashMap<String, Address>,
    ) -> Result<DynSolValue, ScriptError> {
        Ok(match self {
            ConstructorArg::Address(addr) => DynSolValue::Address(*addr),
            ConstructorArg::Contract(name) => DynSolValue::Address(lookup(resolved, name)?),
            ConstructorArg::Uint(value) => DynSolValue::Uint(*value, 256),
            ConstructorArg::String(value) => DynSolValue::String(value.clone()),
        })
    }
}

/// The account whose role membership a [`RoleTarget`] reconciles
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Grantee {
    /// The account running the plan
    Deployer,
    /// The address deployed by the named dependency
    Contract(String),
    /// A fixed account
    Account(Address),
}

/// A desired role membership, expressed in terms of plan steps
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RoleTarget {
    /// The deploy step whose contract holds the role
    pub contract: String,
    /// The role
    pub role: Role,
    /// The account whose membership is reconciled
    pub grantee: Grantee,
    /// Whether the grantee should hold the role
    pub granted: bool,
}

/// What a plan step does when executed
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepAction {
    /// Deploy a contract from a compiled artifact
    Deploy {
        /// The artifact to deploy
        artifact: String,
        /// The constructor arguments
        #[serde(default)]
        args: Vec<ConstructorArg>,
    },
    /// Reconcile role memberships toward the given targets
    GrantRoles {
        /// The desired memberships
        grants: Vec<RoleTarget>,
    },
    /// Mint the initial token supply to the deployer, holding the minter
    /// role only for the duration of the mint
    MintSupply {
        /// The deploy step of the token
        token: String,
        /// The amount to mint, in base units
        amount: U256,
    },
    /// Transfer tokens from the deployer to a deployed contract
    Transfer {
        /// The deploy step of the token
        token: String,
        /// The deploy step of the recipient
        recipient: String,
        /// The amount to transfer, in base units
        amount: U256,
    },
}

impl StepAction {
    /// The steps whose deployed addresses the action reads
    fn contract_references(&self) -> Vec<&str> {
        match self {
            StepAction::Deploy { args, .. } => args
                .iter()
                .filter_map(|arg| match arg {
                    ConstructorArg::Contract(name) => Some(name.as_str()),
                    _ => None,
                })
                .collect(),
            StepAction::GrantRoles { grants } => grants
                .iter()
                .flat_map(|g| {
                    let grantee = match &g.grantee {
                        Grantee::Contract(name) => Some(name.as_str()),
                        _ => None,
                    };
                    std::iter::once(g.contract.as_str()).chain(grantee)
                })
                .collect(),
            StepAction::MintSupply { token, .. } => vec![token.as_str()],
            StepAction::Transfer {
                token, recipient, ..
            } => vec![token.as_str(), recipient.as_str()],
        }
    }

    /// Whether the action deploys a contract
    pub fn is_deploy(&self) -> bool {
        matches!(self, StepAction::Deploy { .. })
    }
}

/// A named step in a deployment plan
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PlanStep {
    /// The step name, also the logical name of any contract it deploys
    pub name: String,
    /// The steps that must complete before this one
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// What the step does
    pub action: StepAction,
    /// Why the step cannot run on the plan's network, if it cannot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unavailable: Option<String>,
}

impl PlanStep {
    /// Create a step with no dependencies
    pub fn new(name: impl Into<String>, action: StepAction) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            action,
            unavailable: None,
        }
    }

    /// A step deploying `artifact` with the given constructor arguments
    pub fn deploy(
        name: impl Into<String>,
        artifact: impl Into<String>,
        args: Vec<ConstructorArg>,
    ) -> Self {
        Self::new(
            name,
            StepAction::Deploy {
                artifact: artifact.into(),
                args,
            },
        )
    }

    /// Declare the steps this one depends on
    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Mark the step as unavailable on the plan's network
    pub fn unavailable(mut self, reason: impl Into<String>) -> Self {
        self.unavailable = Some(reason.into());
        self
    }
}

/// An ordered list of steps to execute against a network
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DeploymentPlan {
    /// The network the plan targets
    pub network: NetworkId,
    /// The steps, in declaration order
    pub steps: Vec<PlanStep>,
}

impl DeploymentPlan {
    /// Create an empty plan for `network`
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            steps: Vec::new(),
        }
    }

    /// Append a step
    pub fn step(mut self, step: PlanStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Look up a step by name
    pub fn get(&self, name: &str) -> Option<&PlanStep> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Validate the plan and compute the order in which its steps execute,
    /// as indices into `steps`
    ///
    /// The order is topological and stable: whenever several steps are
    /// ready, the one declared first runs first.
    pub fn execution_order(&self) -> Result<Vec<usize>, ScriptError> {
        self.validate()?;

        let n = self.steps.len();
        let mut done: HashSet<&str> = HashSet::with_capacity(n);
        let mut scheduled = vec![false; n];
        let mut order = Vec::with_capacity(n);

        while order.len() < n {
            let next = (0..n).find(|&i| {
                !scheduled[i]
                    && self.steps[i]
                        .depends_on
                        .iter()
                        .all(|dep| done.contains(dep.as_str()))
            });

            let Some(i) = next else {
                let stuck = (0..n)
                    .filter(|&i| !scheduled[i])
                    .map(|i| self.steps[i].name.as_str())
                    .collect::<Vec<_>>();
                return Err(ScriptError::Plan(format!(
                    "dependency cycle among steps: {}",
                    stuck.join(", ")
                )));
            };

            scheduled[i] = true;
            done.insert(self.steps[i].name.as_str());
            order.push(i);
        }

        Ok(order)
    }

    /// Check step names, dependency names, and contract references
    fn validate(&self) -> Result<(), ScriptError> {
        let mut by_name: HashMap<&str, &PlanStep> = HashMap::with_capacity(self.steps.len());
        for step in &self.steps {
            if step.name.is_empty() {
                return Err(ScriptError::Plan("step with an empty name".to_string()));
            }
            if by_name.insert(step.name.as_str(), step).is_some() {
                return Err(ScriptError::Plan(format!(
                    "duplicate step name {}",
                    step.name
                )));
            }
        }

        for step in &self.steps {
            for dep in &step.depends_on {
                if dep == &step.name {
                    return Err(ScriptError::Plan(format!("step {} depends on itself", dep)));
                }
                if !by_name.contains_key(dep.as_str()) {
                    return Err(ScriptError::Plan(format!(
                        "step {} depends on unknown step {}",
                        step.name, dep
                    )));
                }
            }

            for reference in step.action.contract_references() {
                if !step.depends_on.iter().any(|d| d == reference) {
                    return Err(ScriptError::Plan(format!(
                        "step {} uses {} without declaring it as a dependency",
                        step.name, reference
                    )));
                }
                // Existence is implied by the dependency check above
                if !by_name[reference].action.is_deploy() {
                    return Err(ScriptError::Plan(format!(
                        "step {} uses {} as a contract, but it does not deploy one",
                        step.name, reference
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Look up the address deployed by `name`
pub(crate) fn lookup(
    resolved: &HashMap<String, Address>,
    name: &str,
) -> Result<Address, ScriptError> {
    resolved
        .get(name)
        .copied()
        .ok_or_else(|| ScriptError::Plan(format!("no address resolved for {name}")))
}
