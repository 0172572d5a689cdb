//! Constants used in the deploy scripts

use std::time::Duration;

/// The name hashed into the OpenZeppelin `MINTER_ROLE` identifier
pub const MINTER_ROLE_NAME: &str = "MINTER_ROLE";

/// The interval at which transaction receipts are polled
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// The default time to wait for a transaction to be confirmed
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

/// The default path of the deployments file
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";

/// The default directory containing compiled contract artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "build/contracts";

/// The extension of a compiled contract artifact
pub const ARTIFACT_EXTENSION: &str = "json";

// -------------
// | Artifacts |
// -------------

/// The OVL ERC20 token artifact
pub const TOKEN_ARTIFACT: &str = "OVLToken";

/// The Chainlink price feed artifact
pub const CHAINLINK_FEED_ARTIFACT: &str = "OVLChainlinkFeed";

/// The fungible position market artifact
pub const POSITION_MARKET_ARTIFACT: &str = "OVLFPosition";

/// The token faucet artifact
pub const CLAIM_ARTIFACT: &str = "OVLClaim";

// -------------------
// | Plan step names |
// -------------------

/// The name of the token deploy step
pub const TOKEN_STEP: &str = "OVLToken";

/// The name of the initial supply mint step
pub const MINT_SUPPLY_STEP: &str = "MintInitialSupply";

/// The name of the faucet deploy step
pub const CLAIM_STEP: &str = "OVLClaim";

/// The name of the faucet funding step
pub const FUND_CLAIM_STEP: &str = "FundOVLClaim";

// ---------------------
// | Deploy parameters |
// ---------------------

/// The number of decimals of the OVL token
pub const TOKEN_DECIMALS: u8 = 18;

/// The token name
pub const DEFAULT_TOKEN_NAME: &str = "Overlay";

/// The token symbol
pub const DEFAULT_TOKEN_SYMBOL: &str = "OVL";

/// The initial supply minted to the deployer, in whole tokens
pub const DEFAULT_INITIAL_SUPPLY: u64 = 100_000;

/// The amount each account may withdraw from the faucet, in whole tokens
pub const DEFAULT_CLAIM_AMOUNT: u64 = 100;

/// The amount transferred to the faucet, in whole tokens
pub const DEFAULT_CLAIM_FUNDING: u64 = 10_000;

/// The base of the metadata URI for position markets
pub const DEFAULT_MARKET_URI_BASE: &str = "https://overlay.exchange/api/ovlfposition";

// -------------------
// | Chainlink feeds |
// -------------------

/// The number of oracle rounds sampled by every built-in feed
pub const DEFAULT_FEED_ROUNDS: u64 = 8;

/// A Chainlink aggregator address per network, empty if the feed is unsupported
pub struct FeedSource {
    /// The market symbol
    pub symbol: &'static str,
    /// The mainnet aggregator
    pub mainnet: &'static str,
    /// The Rinkeby aggregator
    pub rinkeby: &'static str,
    /// The Kovan aggregator
    pub kovan: &'static str,
    /// The aggregator on a mainnet fork
    pub mainnet_fork: &'static str,
    /// The number of oracle rounds sampled
    pub rounds: u64,
}

/// The built-in Chainlink aggregators
pub const CHAINLINK_FEEDS: &[FeedSource] = &[
    FeedSource {
        symbol: "BTCUSD",
        mainnet: "0xF4030086522a5bEEa4988F8cA5B36dbC97BeE88c",
        rinkeby: "0xECe365B379E1dD183B20fc5f022230C044d51404",
        kovan: "0x6135b13325bfC4B00278B4abC5e20bbce2D6580e",
        mainnet_fork: "0xF4030086522a5bEEa4988F8cA5B36dbC97BeE88c",
        // 1h sampling on Rinkeby
        rounds: DEFAULT_FEED_ROUNDS,
    },
    FeedSource {
        symbol: "ETHUSD",
        mainnet: "0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419",
        rinkeby: "0x8A753747A1Fa494EC906cE90E9f37563A8AF630e",
        kovan: "0x9326BFA02ADD2366b30bacB125260Af641031331",
        mainnet_fork: "0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419",
        // 20m sampling on Rinkeby
        rounds: DEFAULT_FEED_ROUNDS,
    },
    FeedSource {
        symbol: "DAIUSD",
        mainnet: "0xAed0c38402a5d19df6E4c03F4E2DceD6e29c1ee9",
        rinkeby: "0x2bA49Aaa16E6afD2a993473cfB70Fa8559B523cF",
        kovan: "0x777A68032a88E5A84678A77Af2CD65A7b3c0775a",
        mainnet_fork: "0xAed0c38402a5d19df6E4c03F4E2DceD6e29c1ee9",
        rounds: DEFAULT_FEED_ROUNDS,
    },
    FeedSource {
        symbol: "GAS",
        mainnet: "0x169E633A2D1E6c10dD91238Ba11c4A708dfEF37C",
        rinkeby: "",
        kovan: "",
        mainnet_fork: "0x169E633A2D1E6c10dD91238Ba11c4A708dfEF37C",
        // Fast Gas/Gwei, 1h sampling on mainnet
        rounds: DEFAULT_FEED_ROUNDS,
    },
];
