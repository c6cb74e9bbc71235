// node/src/script.rs
//! JSON operation scripts replayed against a devnet

use crate::runtime::Devnet;
use bridge_core::{Amount, Asset, ChainId};
use bridge_crypto::Address;
use query::methods::QueryMethods;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use transport::Delivery;

/// Synthetic amount named by symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticAmount {
    pub symbol: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Send every configured link
    LinkAll,
    Fund {
        chain_id: ChainId,
        token: Address,
        holder: Address,
        amount: Amount,
    },
    Deposit {
        chain_id: ChainId,
        depositor: Address,
        recipient: Address,
        assets: Vec<Asset>,
    },
    BridgeOut {
        holder: Address,
        recipient: Address,
        dest_chain: ChainId,
        assets: Vec<SyntheticAmount>,
    },
    SetLinkPaused {
        symbol: String,
        chain_id: ChainId,
        paused: bool,
    },
    SetAssetPaused {
        symbol: String,
        paused: bool,
    },
    SetVaultAssetPaused {
        chain_id: ChainId,
        token: Address,
        paused: bool,
    },
    SetVaultPaused {
        chain_id: ChainId,
        paused: bool,
    },
    Rescue {
        chain_id: ChainId,
        token: Address,
        to: Address,
        amount: Amount,
    },
    Pump,
    RetryParked,
    Query {
        method: String,
        #[serde(default)]
        params: Value,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::LinkAll => "link_all",
            Step::Fund { .. } => "fund",
            Step::Deposit { .. } => "deposit",
            Step::BridgeOut { .. } => "bridge_out",
            Step::SetLinkPaused { .. } => "set_link_paused",
            Step::SetAssetPaused { .. } => "set_asset_paused",
            Step::SetVaultAssetPaused { .. } => "set_vault_asset_paused",
            Step::SetVaultPaused { .. } => "set_vault_paused",
            Step::Rescue { .. } => "rescue",
            Step::Pump => "pump",
            Step::RetryParked => "retry_parked",
            Step::Query { .. } => "query",
        }
    }
}

/// Result of one step; failures are recorded, not fatal
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: usize,
    pub op: &'static str,
    pub ok: bool,
    pub output: Value,
}

fn deliveries_json(deliveries: &[Delivery]) -> Value {
    let items: Vec<Value> = deliveries
        .iter()
        .map(|delivery| match delivery {
            Delivery::Executed(guid) => json!({ "executed": guid.to_hex() }),
            Delivery::Replayed(guid) => json!({ "replayed": guid.to_hex() }),
            Delivery::Parked { guid, reason } => json!({ "parked": guid.to_hex(), "reason": reason }),
        })
        .collect();
    Value::Array(items)
}

impl Devnet {
    pub fn apply(&mut self, step: &Step) -> anyhow::Result<Value> {
        let owner = self.owner();
        match step {
            Step::LinkAll => Ok(deliveries_json(&self.link_all()?)),
            Step::Fund {
                chain_id,
                token,
                holder,
                amount,
            } => {
                self.fund(*chain_id, token, holder, amount)?;
                Ok(Value::Null)
            }
            Step::Deposit {
                chain_id,
                depositor,
                recipient,
                assets,
            } => Ok(deliveries_json(&self.deposit(*chain_id, depositor, recipient, assets)?)),
            Step::BridgeOut {
                holder,
                recipient,
                dest_chain,
                assets,
            } => {
                let assets = assets
                    .iter()
                    .map(|asset| Ok(Asset::new(self.synthetic(&asset.symbol)?, asset.amount.clone())))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                let (receipt, deliveries) = self.bridge_out(holder, recipient, &assets, *dest_chain)?;
                Ok(json!({
                    "quotes": serde_json::to_value(&receipt.assets)?,
                    "fee": serde_json::to_value(&receipt.receipt.fee)?,
                    "deliveries": deliveries_json(&deliveries),
                }))
            }
            Step::SetLinkPaused {
                symbol,
                chain_id,
                paused,
            } => {
                let synthetic = self.synthetic(symbol)?;
                self.hub_mut()
                    .set_link_paused(&owner, &synthetic, *chain_id, *paused)?;
                Ok(Value::Null)
            }
            Step::SetAssetPaused { symbol, paused } => {
                let synthetic = self.synthetic(symbol)?;
                self.hub_mut().set_asset_paused(&owner, &synthetic, *paused)?;
                Ok(Value::Null)
            }
            Step::SetVaultAssetPaused {
                chain_id,
                token,
                paused,
            } => {
                self.vault_mut(*chain_id)?
                    .set_asset_paused(&owner, token, *paused)?;
                Ok(Value::Null)
            }
            Step::SetVaultPaused { chain_id, paused } => {
                self.vault_mut(*chain_id)?.set_vault_paused(&owner, *paused)?;
                Ok(Value::Null)
            }
            Step::Rescue {
                chain_id,
                token,
                to,
                amount,
            } => {
                self.vault_mut(*chain_id)?.rescue(&owner, token, to, amount)?;
                Ok(Value::Null)
            }
            Step::Pump => Ok(deliveries_json(&self.pump())),
            Step::RetryParked => Ok(deliveries_json(&self.retry_parked()?)),
            Step::Query { method, params } => {
                let methods = QueryMethods::new(self.query());
                Ok(methods.handle(method, params.clone())?)
            }
        }
    }

    /// Apply every step in order, recording failures instead of stopping
    pub fn run_script(&mut self, steps: &[Step]) -> Vec<StepOutcome> {
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| match self.apply(step) {
                Ok(output) => StepOutcome {
                    step: index,
                    op: step.name(),
                    ok: true,
                    output,
                },
                Err(err) => {
                    tracing::warn!(step = index, op = step.name(), %err, "Script step rejected");
                    StepOutcome {
                        step: index,
                        op: step.name(),
                        ok: false,
                        output: json!(err.to_string()),
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;

    #[test]
    fn test_script_parses_from_json() {
        let script = r#"[
            {"op": "link_all"},
            {"op": "fund", "chain_id": 1, "token": "0x0000000000000000000000000000000000002001",
             "holder": "0x00000000000000000000000000000000000000aa", "amount": "1000000"},
            {"op": "query", "method": "hub_assetCount"}
        ]"#;
        let steps: Vec<Step> = serde_json::from_str(script).unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[1].name(), "fund");
        assert!(matches!(&steps[2], Step::Query { params, .. } if params.is_null()));
    }

    #[test]
    fn test_failed_steps_are_recorded() {
        let mut devnet = Devnet::new(BridgeConfig::default()).unwrap();
        let holder = Address::from_low_u64(0xaa);
        let steps = vec![
            Step::LinkAll,
            Step::BridgeOut {
                holder,
                recipient: holder,
                dest_chain: 1,
                assets: vec![SyntheticAmount {
                    symbol: "sUSDT".into(),
                    amount: Amount::from_u64(1),
                }],
            },
            Step::Query {
                method: "hub_assetCount".into(),
                params: Value::Null,
            },
        ];

        let outcomes = devnet.run_script(&steps);
        assert!(outcomes[0].ok);
        assert!(!outcomes[1].ok);
        assert!(outcomes[2].ok);
        assert_eq!(outcomes[2].output, json!(2));
    }
}
