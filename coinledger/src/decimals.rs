use crate::errors::CoinLedgerError;
use crate::models::{ChainAsset, NATIVE_ASSET_DECIMALS};
use crate::rpc::ContractCaller;
use async_trait::async_trait;
#[cfg(any(test, feature = "test-util"))]
use mockall::automock;
use num_traits::ToPrimitive;

#[cfg_attr(any(test, feature = "test-util"), automock)]
#[async_trait]
pub trait DecimalsResolver: Send + Sync {
    /// `token_address == None` is the chain's native asset.
    async fn resolve_decimals(&self, chain: &ChainAsset, token_address: Option<String>) -> Result<u32, CoinLedgerError>;
}

/// Reads `decimals()` from the token contract.
pub struct RpcDecimalsResolver {
    caller: ContractCaller,
}

impl RpcDecimalsResolver {
    pub fn new(caller: ContractCaller) -> RpcDecimalsResolver {
        RpcDecimalsResolver { caller }
    }
}

#[async_trait]
impl DecimalsResolver for RpcDecimalsResolver {
    async fn resolve_decimals(&self, chain: &ChainAsset, token_address: Option<String>) -> Result<u32, CoinLedgerError> {
        let token_address = match token_address {
            None => return Ok(NATIVE_ASSET_DECIMALS),
            Some(address) => address,
        };
        let node_url = self.caller.node_url(chain)?;
        let decimals = self.caller.call_uint(&node_url, &token_address, "decimals", None).await?;
        decimals.to_u32()
            .ok_or_else(|| CoinLedgerError::Overflow(format!("decimals {} of {}", decimals, token_address)))
    }
}
