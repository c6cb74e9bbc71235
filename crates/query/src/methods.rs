// query/src/methods.rs
use crate::{HubQuery, QueryError, QueryResult};
use bridge_core::Transport;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// JSON method dispatcher over a [`HubQuery`]
pub struct QueryMethods<'a, T: Transport> {
    query: HubQuery<'a, T>,
}

impl<'a, T: Transport> QueryMethods<'a, T> {
    pub fn new(query: HubQuery<'a, T>) -> Self {
        Self { query }
    }

    pub fn handle(&self, method: &str, params: Value) -> QueryResult<Value> {
        let params = Params::parse(params)?;
        match method {
            // Registry
            "hub_assetCount" => Ok(json!(self.query.asset_count())),
            "hub_assetInfo" => Ok(serde_json::to_value(self.query.asset_info(params.get(0, "index")?)?)?),
            "hub_assetsInfo" => {
                let indices: Vec<bridge_core::AssetIndex> = params.get_or_default(0)?;
                Ok(serde_json::to_value(self.query.assets_info(&indices)?)?)
            }
            "hub_assetIndexOf" => Ok(json!(self.query.asset_index_of(&params.get(0, "address")?))),
            "hub_syntheticAssetIndex" => Ok(json!(self.query.synthetic_asset_index(&params.get(0, "address")?)?)),
            "hub_isRegistered" => Ok(json!(self.query.is_registered(&params.get(0, "address")?))),
            "hub_chainList" => Ok(json!(self.query.chain_list(params.get(0, "index")?)?)),

            // Links
            "hub_remoteLinkInfo" => {
                let info = self.query.remote_link_info(&params.get(0, "synthetic")?, params.get(1, "chainId")?);
                Ok(serde_json::to_value(info)?)
            }
            "hub_remoteAddressFor" => {
                let remote = self.query.remote_address_for(params.get(0, "chainId")?, &params.get(1, "synthetic")?);
                Ok(serde_json::to_value(remote)?)
            }
            "hub_syntheticAddressFor" => {
                let synthetic = self.query.synthetic_address_for(params.get(0, "chainId")?, &params.get(1, "remote")?);
                Ok(serde_json::to_value(synthetic)?)
            }
            "hub_gatewayVaultFor" => Ok(serde_json::to_value(self.query.gateway_vault_for(params.get(0, "chainId")?))?),
            "hub_bonusBalance" => {
                let bonus = self.query.bonus_balance(&params.get(0, "synthetic")?, params.get(1, "chainId")?);
                Ok(serde_json::to_value(bonus)?)
            }

            // Balances
            "hub_balanceOf" => {
                let balance = self.query.balance_of(&params.get(0, "synthetic")?, &params.get(1, "holder")?);
                Ok(serde_json::to_value(balance)?)
            }
            "hub_totalSupply" => Ok(serde_json::to_value(self.query.total_supply(&params.get(0, "synthetic")?))?),

            _ => Err(QueryError::MethodNotFound(method.to_string())),
        }
    }
}

/// Positional parameters
struct Params(Vec<Value>);

impl Params {
    fn parse(params: Value) -> QueryResult<Self> {
        match params {
            Value::Null => Ok(Self(Vec::new())),
            Value::Array(values) => Ok(Self(values)),
            _ => Err(QueryError::InvalidParams("Expected array".into())),
        }
    }

    fn get<P: DeserializeOwned>(&self, position: usize, name: &str) -> QueryResult<P> {
        let value = self
            .0
            .get(position)
            .ok_or_else(|| QueryError::InvalidParams(format!("Missing {name}")))?;
        serde_json::from_value(value.clone()).map_err(|e| QueryError::InvalidParams(format!("Invalid {name}: {e}")))
    }

    fn get_or_default<P: DeserializeOwned + Default>(&self, position: usize) -> QueryResult<P> {
        match self.0.get(position) {
            None | Some(Value::Null) => Ok(P::default()),
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(|e| QueryError::InvalidParams(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::tests::sample_hub;
    use bridge_crypto::Address;

    #[test]
    fn test_dispatch_registry_methods() {
        let (hub, synthetic) = sample_hub();
        let methods = QueryMethods::new(HubQuery::new(&hub));

        assert_eq!(methods.handle("hub_assetCount", Value::Null).unwrap(), json!(2));
        assert_eq!(methods.handle("hub_assetIndexOf", json!([synthetic])).unwrap(), json!(1));
        assert_eq!(methods.handle("hub_isRegistered", json!([synthetic])).unwrap(), json!(true));

        let info = methods.handle("hub_assetInfo", json!([1])).unwrap();
        assert_eq!(info["symbol"], json!("sUSDT"));
        assert_eq!(info["links"][0]["decimals_delta"], json!(12));

        let all = methods.handle("hub_assetsInfo", json!([])).unwrap();
        assert_eq!(all.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_dispatch_link_methods() {
        let (hub, synthetic) = sample_hub();
        let methods = QueryMethods::new(HubQuery::new(&hub));
        let remote = Address::from_low_u64(0x2002);

        let found = methods.handle("hub_remoteAddressFor", json!([2, synthetic])).unwrap();
        assert_eq!(found, serde_json::to_value(remote).unwrap());

        let missing = methods.handle("hub_syntheticAddressFor", json!([9, remote])).unwrap();
        assert_eq!(missing, serde_json::to_value(Address::zero()).unwrap());

        let bonus = methods.handle("hub_bonusBalance", json!([synthetic, 2])).unwrap();
        assert_eq!(bonus, json!("0"));
    }

    #[test]
    fn test_bad_requests() {
        let (hub, _) = sample_hub();
        let methods = QueryMethods::new(HubQuery::new(&hub));

        assert!(matches!(
            methods.handle("hub_mint", Value::Null),
            Err(QueryError::MethodNotFound(_))
        ));
        assert!(matches!(
            methods.handle("hub_assetInfo", json!({"index": 1})),
            Err(QueryError::InvalidParams(_))
        ));
        assert!(matches!(
            methods.handle("hub_assetInfo", json!([])),
            Err(QueryError::InvalidParams(_))
        ));
        assert!(matches!(
            methods.handle("hub_syntheticAssetIndex", json!([Address::from_low_u64(77)])),
            Err(QueryError::NotFound(_))
        ));
    }
}
