use crate::errors::CoinLedgerError;
use crate::models::ChainAsset;
#[cfg(any(test, feature = "test-util"))]
use mockall::automock;
use serde::Deserialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Evm,
    Solana,
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChainFamily::Evm => write!(f, "evm"),
            ChainFamily::Solana => write!(f, "solana"),
        }
    }
}

/// How to reach the node for one chain.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RpcConfiguration {
    pub chain_name: String,
    pub rpc_url: String,
    #[serde(rename = "chain_type")]
    pub chain_family: ChainFamily,
}

#[cfg_attr(any(test, feature = "test-util"), automock)]
pub trait ConfigurationResolver: Send + Sync {
    fn resolve_configuration(&self, chain_name: &str) -> Option<RpcConfiguration>;
}

/// Looks chains up in a fixed list; the first configuration with a matching name wins.
pub struct DefaultConfigurationResolver {
    configurations: Vec<RpcConfiguration>,
}

impl DefaultConfigurationResolver {
    pub fn new(configurations: Vec<RpcConfiguration>) -> DefaultConfigurationResolver {
        DefaultConfigurationResolver { configurations }
    }
}

impl ConfigurationResolver for DefaultConfigurationResolver {
    fn resolve_configuration(&self, chain_name: &str) -> Option<RpcConfiguration> {
        self.configurations.iter()
            .find(|c| c.chain_name == chain_name)
            .cloned()
    }
}

/// Node URL for the asset's chain, which must belong to `required` family.
pub fn resolve_rpc_url(resolver: &dyn ConfigurationResolver, asset: &ChainAsset, required: ChainFamily) -> Result<String, CoinLedgerError> {
    if asset.chain_name.is_empty() {
        return Err(CoinLedgerError::MissingField("chain name"));
    }
    let configuration = resolver.resolve_configuration(&asset.chain_name)
        .ok_or_else(|| CoinLedgerError::ChainNotFound(asset.chain_name.clone()))?;
    if configuration.chain_family != required {
        return Err(CoinLedgerError::ChainFamilyMismatch {
            chain: asset.chain_name.clone(),
            required,
            actual: configuration.chain_family,
        });
    }
    Ok(configuration.rpc_url)
}

/// A node URL must be http(s) with a host.
pub fn validate_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}
