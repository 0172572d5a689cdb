//! The durable record of deployed contracts and completed actions, keyed by
//! network and logical name

use std::{
    collections::BTreeMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::{
    errors::ScriptError,
    types::{ActionRecord, DeployedContract, NetworkId},
};

/// The on-disk layout of the deployments file
#[derive(Serialize, Deserialize, Default, Debug)]
struct DeploymentsFile {
    /// Deployed contracts per network, keyed by logical name
    #[serde(default)]
    deployments: BTreeMap<NetworkId, BTreeMap<String, DeployedContract>>,
    /// Completed non-repeatable actions per network, keyed by step name
    #[serde(default)]
    actions: BTreeMap<NetworkId, BTreeMap<String, ActionRecord>>,
}

/// A registry of deployed contracts
///
/// When backed by a file, every mutation is written through before it
/// returns, so a run that crashes can be resumed from the file.
#[derive(Debug)]
pub struct ContractRegistry {
    /// The deployments file, `None` for an in-memory registry
    path: Option<PathBuf>,
    /// The current contents
    state: DeploymentsFile,
}

impl ContractRegistry {
    /// Open the registry stored at `path`; a missing file yields an empty registry
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ScriptError> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                ScriptError::ReadDeployments(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => DeploymentsFile::default(),
            Err(e) => {
                return Err(ScriptError::ReadDeployments(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };

        Ok(Self {
            path: Some(path),
            state,
        })
    }

    /// Create a registry that is never persisted
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: DeploymentsFile::default(),
        }
    }

    /// The file backing the registry, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Look up the contract recorded for `name` on `network`
    pub fn get(&self, network: NetworkId, name: &str) -> Option<&DeployedContract> {
        self.state.deployments.get(&network)?.get(name)
    }

    /// Record a deployed contract
    ///
    /// Recording the same address twice is a no-op; recording a different
    /// address for an occupied slot fails with [`ScriptError::DuplicateRecord`]
    pub fn put(
        &mut self,
        network: NetworkId,
        name: &str,
        contract: DeployedContract,
    ) -> Result<(), ScriptError> {
        if let Some(existing) = self.get(network, name) {
            if existing.address == contract.address {
                return Ok(());
            }

            return Err(ScriptError::DuplicateRecord(format!(
                "{name} on {network} is recorded at {:#x}, refusing to overwrite with {:#x}",
                existing.address, contract.address
            )));
        }

        debug!(step = name, network = %network, address = %contract.address, "recording deployment");
        self.state
            .deployments
            .entry(network)
            .or_default()
            .insert(name.to_string(), contract);
        self.persist()
    }

    /// All contracts recorded on `network`, ordered by logical name
    pub fn all(&self, network: NetworkId) -> Vec<&DeployedContract> {
        self.state
            .deployments
            .get(&network)
            .map(|contracts| contracts.values().collect())
            .unwrap_or_default()
    }

    /// Look up the journal entry for the action step `name` on `network`
    pub fn action(&self, network: NetworkId, name: &str) -> Option<&ActionRecord> {
        self.state.actions.get(&network)?.get(name)
    }

    /// Journal a completed action step
    pub fn record_action(
        &mut self,
        network: NetworkId,
        name: &str,
        record: ActionRecord,
    ) -> Result<(), ScriptError> {
        debug!(step = name, network = %network, "recording action");
        self.state
            .actions
            .entry(network)
            .or_default()
            .insert(name.to_string(), record);
        self.persist()
    }

    /// Atomically rewrite the backing file, if any
    fn persist(&self) -> Result<(), ScriptError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let write_err = |e: &dyn std::fmt::Display| {
            ScriptError::WriteDeployments(format!("{}: {}", path.display(), e))
        };

        let contents = serde_json::to_string_pretty(&self.state).map_err(|e| write_err(&e))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir).map_err(|e| write_err(&e))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| write_err(&e))?;
        file.as_file().sync_all().map_err(|e| write_err(&e))?;
        file.persist(path).map_err(|e| write_err(&e))?;

        Ok(())
    }
}
