//! Loading of compiled contract artifacts

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy_primitives::Bytes;
use serde::Deserialize;

use crate::{constants::ARTIFACT_EXTENSION, errors::ScriptError};

/// The fields of a compiled artifact file used for deployment
#[derive(Deserialize)]
struct ArtifactFile {
    /// The creation bytecode, in hex
    bytecode: String,
}

/// A compiled contract ready for deployment
#[derive(Clone, Debug)]
pub struct ContractArtifact {
    /// The contract name
    pub name: String,
    /// The creation bytecode, without constructor arguments
    pub bytecode: Bytes,
}

/// A directory of compiled artifacts, one `<Name>.json` file per contract
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    /// The directory containing the artifacts
    dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store reading from `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory the store reads from
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the artifact for the named contract
    pub fn load(&self, name: &str) -> Result<ContractArtifact, ScriptError> {
        let path = self.dir.join(name).with_extension(ARTIFACT_EXTENSION);
        let contents = fs::read_to_string(&path)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;

        parse_artifact(name, &contents)
    }
}

/// Parse an artifact file's contents
pub fn parse_artifact(name: &str, contents: &str) -> Result<ContractArtifact, ScriptError> {
    let file: ArtifactFile = serde_json::from_str(contents)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{name}: {e}")))?;

    if file.bytecode.trim_start_matches("0x").is_empty() {
        return Err(ScriptError::ArtifactParsing(format!(
            "{name}: artifact has no bytecode, is the contract abstract?"
        )));
    }

    let bytecode = Bytes::from_str(&file.bytecode)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{name}: {e}")))?;

    Ok(ContractArtifact {
        name: name.to_string(),
        bytecode,
    })
}
