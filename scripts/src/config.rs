//! Network and deployment configuration

use std::{collections::BTreeMap, fs, path::Path, str::FromStr};

use alloy_primitives::{utils::parse_units, Address, U256};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        CHAINLINK_FEEDS, DEFAULT_CLAIM_AMOUNT, DEFAULT_CLAIM_FUNDING, DEFAULT_INITIAL_SUPPLY,
        DEFAULT_MARKET_URI_BASE, DEFAULT_TOKEN_NAME, DEFAULT_TOKEN_SYMBOL, TOKEN_DECIMALS,
    },
    errors::ScriptError,
    types::{FeedSpec, NetworkId},
};

/// A price feed and its oracle source on each network
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FeedConfig {
    /// The market symbol
    pub symbol: String,
    /// The number of oracle rounds the feed samples over
    pub rounds: u64,
    /// The oracle source per network; a missing or empty entry means the
    /// feed is unsupported there
    #[serde(default)]
    pub sources: BTreeMap<NetworkId, String>,
}

/// The external addresses and parameters the plan depends on, per network
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    /// The price feeds to deploy, each backing one position market
    pub feeds: Vec<FeedConfig>,
}

impl NetworkConfig {
    /// The built-in Chainlink feed table
    pub fn builtin() -> Self {
        let feeds = CHAINLINK_FEEDS
            .iter()
            .map(|feed| FeedConfig {
                symbol: feed.symbol.to_string(),
                rounds: feed.rounds,
                sources: [
                    (NetworkId::Mainnet, feed.mainnet),
                    (NetworkId::Rinkeby, feed.rinkeby),
                    (NetworkId::Kovan, feed.kovan),
                    (NetworkId::MainnetFork, feed.mainnet_fork),
                ]
                .into_iter()
                .map(|(network, source)| (network, source.to_string()))
                .collect(),
            })
            .collect();

        Self { feeds }
    }

    /// Load a feed table from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| ScriptError::Config(format!("{}: {}", path.display(), e)))
    }

    /// The feeds to deploy on `network`, in declaration order
    pub fn feeds(&self, network: NetworkId) -> Result<Vec<FeedSpec>, ScriptError> {
        self.feeds
            .iter()
            .map(|feed| {
                let source = match feed.sources.get(&network).map(|s| s.trim()) {
                    None | Some("") => None,
                    Some(addr) => Some(Address::from_str(addr).map_err(|e| {
                        ScriptError::Config(format!(
                            "invalid {} source on {network}: {addr}: {e}",
                            feed.symbol
                        ))
                    })?),
                };

                Ok(FeedSpec {
                    symbol: feed.symbol.clone(),
                    source,
                    rounds: feed.rounds,
                })
            })
            .collect()
    }
}

/// Parameters of the Overlay contracts deployed by the plan
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployParams {
    /// The token name
    pub token_name: String,
    /// The token symbol
    pub token_symbol: String,
    /// The supply minted to the deployer, in base units
    pub initial_supply: U256,
    /// The amount each account may withdraw from the faucet, in base units
    pub claim_amount: U256,
    /// The amount transferred to the faucet, in base units
    pub claim_funding: U256,
    /// The base of each position market's metadata URI
    pub market_uri_base: String,
}

impl Default for DeployParams {
    fn default() -> Self {
        Self {
            token_name: DEFAULT_TOKEN_NAME.to_string(),
            token_symbol: DEFAULT_TOKEN_SYMBOL.to_string(),
            initial_supply: whole_tokens(DEFAULT_INITIAL_SUPPLY),
            claim_amount: whole_tokens(DEFAULT_CLAIM_AMOUNT),
            claim_funding: whole_tokens(DEFAULT_CLAIM_FUNDING),
            market_uri_base: DEFAULT_MARKET_URI_BASE.to_string(),
        }
    }
}

impl DeployParams {
    /// The ERC1155 metadata URI of the position market for `symbol`
    ///
    /// The trailing `{id}` is substituted by clients, per the ERC1155 metadata spec
    pub fn market_uri(&self, symbol: &str) -> String {
        format!(
            "{}/{}/{{id}}.json",
            self.market_uri_base.trim_end_matches('/'),
            symbol
        )
    }
}

/// Convert a number of whole tokens into base units
pub fn whole_tokens(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(TOKEN_DECIMALS))
}

/// Parse a decimal token amount, e.g. `"100.5"`, into base units
pub fn parse_token_amount(amount: &str) -> Result<U256, ScriptError> {
    parse_units(amount, TOKEN_DECIMALS)
        .map(|units| units.get_absolute())
        .map_err(|e| ScriptError::Config(format!("invalid token amount {amount}: {e}")))
}
