// node/src/config.rs
use bridge_core::{Amount, ChainId, TransportOptions};
use bridge_crypto::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use transport::FeeSchedule;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub hub: HubConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    pub chains: Vec<ChainConfig>,
    pub assets: Vec<AssetConfig>,
    #[serde(default)]
    pub links: Vec<LinkConfig>,
    #[serde(default)]
    pub balancer: Vec<BalancerEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    pub chain_id: ChainId,
    pub address: Address,
    /// Admin of the hub and every vault
    pub owner: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    pub fees: FeeSchedule,
    pub gas_limit: u64,
}

/// One remote chain with its vault and native tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: ChainId,
    pub vault_address: Address,
    pub tokens: Vec<TokenConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

/// Synthetic asset created on the hub at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    pub chain_id: ChainId,
    pub remote_token: Address,
    /// Symbol of the synthetic asset
    pub synthetic: String,
    #[serde(default)]
    pub min_bridge_amount: Amount,
    #[serde(default)]
    pub paused: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancerEntry {
    pub synthetic: String,
    pub chain_id: ChainId,
    pub threshold_weight: u32,
    #[serde(default = "default_curve_flattener")]
    pub curve_flattener: u32,
}

fn default_curve_flattener() -> u32 {
    balancer::DEFAULT_CURVE_FLATTENER
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            fees: FeeSchedule::default(),
            gas_limit: TransportOptions::default().gas_limit,
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let usdt_a = Address::from_low_u64(0x2001);
        let wbtc_a = Address::from_low_u64(0x3001);
        let usdt_b = Address::from_low_u64(0x2002);

        Self {
            hub: HubConfig {
                chain_id: 100,
                address: Address::from_low_u64(0x100),
                owner: Address::from_low_u64(0x1),
            },
            transport: TransportConfig::default(),
            chains: vec![
                ChainConfig {
                    chain_id: 1,
                    vault_address: Address::from_low_u64(0x1001),
                    tokens: vec![
                        TokenConfig {
                            address: usdt_a,
                            symbol: "USDT".into(),
                            decimals: 6,
                        },
                        TokenConfig {
                            address: wbtc_a,
                            symbol: "WBTC".into(),
                            decimals: 8,
                        },
                    ],
                },
                ChainConfig {
                    chain_id: 2,
                    vault_address: Address::from_low_u64(0x1002),
                    tokens: vec![TokenConfig {
                        address: usdt_b,
                        symbol: "USDT".into(),
                        decimals: 18,
                    }],
                },
            ],
            assets: vec![
                AssetConfig {
                    symbol: "sUSDT".into(),
                    decimals: 18,
                },
                AssetConfig {
                    symbol: "sWBTC".into(),
                    decimals: 8,
                },
            ],
            links: vec![
                LinkConfig {
                    chain_id: 1,
                    remote_token: usdt_a,
                    synthetic: "sUSDT".into(),
                    min_bridge_amount: Amount::zero(),
                    paused: false,
                },
                LinkConfig {
                    chain_id: 1,
                    remote_token: wbtc_a,
                    synthetic: "sWBTC".into(),
                    min_bridge_amount: Amount::zero(),
                    paused: false,
                },
                LinkConfig {
                    chain_id: 2,
                    remote_token: usdt_b,
                    synthetic: "sUSDT".into(),
                    min_bridge_amount: Amount::zero(),
                    paused: false,
                },
            ],
            balancer: vec![
                BalancerEntry {
                    synthetic: "sUSDT".into(),
                    chain_id: 1,
                    threshold_weight: 500_000,
                    curve_flattener: 3,
                },
                BalancerEntry {
                    synthetic: "sUSDT".into(),
                    chain_id: 2,
                    threshold_weight: 500_000,
                    curve_flattener: 3,
                },
            ],
        }
    }
}

impl BridgeConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn chain(&self, chain_id: ChainId) -> Option<&ChainConfig> {
        self.chains.iter().find(|chain| chain.chain_id == chain_id)
    }

    /// Cross-reference checks the individual sections cannot express
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut chain_ids = BTreeSet::new();
        for chain in &self.chains {
            if chain.chain_id == self.hub.chain_id {
                anyhow::bail!("chain {} is the hub chain", chain.chain_id);
            }
            if !chain_ids.insert(chain.chain_id) {
                anyhow::bail!("chain {} configured twice", chain.chain_id);
            }
        }

        let mut symbols = BTreeSet::new();
        for asset in &self.assets {
            if !symbols.insert(asset.symbol.as_str()) {
                anyhow::bail!("asset {} configured twice", asset.symbol);
            }
        }

        for link in &self.links {
            let chain = self
                .chain(link.chain_id)
                .ok_or_else(|| anyhow::anyhow!("link references unknown chain {}", link.chain_id))?;
            if !chain.tokens.iter().any(|token| token.address == link.remote_token) {
                anyhow::bail!("token {} is not native to chain {}", link.remote_token, link.chain_id);
            }
            if !symbols.contains(link.synthetic.as_str()) {
                anyhow::bail!("link references unknown asset {}", link.synthetic);
            }
        }

        for entry in &self.balancer {
            if !symbols.contains(entry.synthetic.as_str()) {
                anyhow::bail!("balancer entry references unknown asset {}", entry.synthetic);
            }
            if !chain_ids.contains(&entry.chain_id) {
                anyhow::bail!("balancer entry references unknown chain {}", entry.chain_id);
            }
        }
        Ok(())
    }
}
