use crate::errors::CoinLedgerError;
use crate::models::{AssetAddress, OnchainAccount, TokenizedVault, WrappedToken};
use crate::rpc::{strip_address_padding, ContractCaller};
use log::{debug, warn};

const VAULT_ASSET: &str = "asset";

/// Works out which address an account should be priced by.
/// `None` means the native asset of the chain.
pub struct AssetResolver {
    caller: ContractCaller,
}

impl AssetResolver {
    pub fn new(caller: ContractCaller) -> AssetResolver {
        AssetResolver { caller }
    }

    pub async fn resolve_asset_address(&self, account: &OnchainAccount) -> Result<AssetAddress, CoinLedgerError> {
        match account {
            OnchainAccount::Fungible(token) => Ok(Some(token.token_address.clone())),
            OnchainAccount::Vault(vault) => self.resolve_vault_asset(vault).await,
            OnchainAccount::Wrapped(wrapped) => self.resolve_base_token(wrapped).await.map(Some),
        }
    }

    async fn resolve_vault_asset(&self, vault: &TokenizedVault) -> Result<AssetAddress, CoinLedgerError> {
        if let Some(backing_asset) = &vault.backing_asset {
            return Ok(backing_asset.contract_address.clone());
        }
        if vault.vault_address.is_empty() {
            return Err(CoinLedgerError::MissingField("vault address"));
        }

        let node_url = self.caller.node_url(&vault.chain)?;
        match self.caller.call(&node_url, &vault.vault_address, VAULT_ASSET, None).await {
            Ok(word) => strip_address_padding(&word).map(Some),
            // A revert on asset() is read as "no such accessor", i.e. a native-asset vault.
            // Any other revert cause on asset() is misread the same way.
            Err(err) if err.rpc_error().is_some_and(|rpc| rpc.is_execution_reverted()) => {
                warn!("vault {} reverted on asset(); pricing it as the native asset", vault.vault_address);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn resolve_base_token(&self, wrapped: &WrappedToken) -> Result<String, CoinLedgerError> {
        if wrapped.base_token_address_function.is_empty() {
            return Err(CoinLedgerError::MissingField("base token address function name"));
        }
        let token = &wrapped.token;
        let node_url = self.caller.node_url(&token.chain)?;
        let word = self.caller.call(&node_url, &token.token_address, &wrapped.base_token_address_function, None).await?;
        let address = strip_address_padding(&word)?;
        debug!("{} wraps {}", token.token_address, address);
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainFamily, DefaultConfigurationResolver, RpcConfiguration};
    use crate::models::{BackingAsset, ChainAsset, FungibleToken, WalletRef};
    use crate::testing::{MockEvmNode, MockRpcResult, NODE_URL};
    use std::sync::Arc;

    const CHAIN: &str = "ethereum";
    const WALLET: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f2bD18";
    const VAULT: &str = "0x68d30f47F19c07bCCEf4Ac7FAE2Dc12FCa3e0dC9";
    const ASSET: &str = "0x4838B106FCe9647Bdf1E7877BF73cE8B0BAD5f97";
    const BASE_TOKEN: &str = "0x388C818CA8B9251b393131C08a736A67ccB19297";

    fn resolver(node: MockEvmNode) -> AssetResolver {
        let configurations = DefaultConfigurationResolver::new(vec![RpcConfiguration {
            chain_name: CHAIN.to_string(),
            rpc_url: NODE_URL.to_string(),
            chain_family: ChainFamily::Evm,
        }]);
        AssetResolver::new(ContractCaller::new(Arc::new(configurations), Arc::new(node)))
    }

    fn token(address: &str) -> FungibleToken {
        FungibleToken {
            chain: ChainAsset { chain_name: CHAIN.to_string() },
            wallet: WalletRef { wallet_address: WALLET.to_string() },
            token_address: address.to_string(),
        }
    }

    fn vault(backing_asset: Option<BackingAsset>) -> OnchainAccount {
        OnchainAccount::Vault(TokenizedVault {
            chain: ChainAsset { chain_name: CHAIN.to_string() },
            wallet: WalletRef { wallet_address: WALLET.to_string() },
            vault_address: VAULT.to_string(),
            share_balance_function: "balanceOf".to_string(),
            backing_asset,
        })
    }

    #[tokio::test]
    async fn test_token_prices_as_itself() {
        let address = resolver(MockEvmNode::new())
            .resolve_asset_address(&OnchainAccount::Fungible(token("0x1234"))).await
            .unwrap();
        assert_eq!(Some("0x1234".to_string()), address);
    }

    #[tokio::test]
    async fn test_vault_asset_strips_padding() {
        let mut node = MockEvmNode::new();
        node.register_eth_call("asset", VAULT, &[], |_| MockRpcResult::Address(ASSET.to_string()));

        let address = resolver(node).resolve_asset_address(&vault(None)).await.unwrap();
        assert_eq!(Some(ASSET.to_string()), address);
    }

    #[tokio::test]
    async fn test_vault_without_asset_function_is_native() {
        let mut node = MockEvmNode::new();
        node.register_contract(VAULT);

        let address = resolver(node).resolve_asset_address(&vault(None)).await.unwrap();
        assert_eq!(None, address);
    }

    #[tokio::test]
    async fn test_vault_other_rpc_errors_propagate() {
        let mut node = MockEvmNode::new();
        node.register_eth_call("asset", VAULT, &[], |_| MockRpcResult::Error { code: -32005, message: "limit exceeded".to_string() });

        let err = resolver(node).resolve_asset_address(&vault(None)).await.unwrap_err();
        assert_eq!(-32005, err.rpc_error().unwrap().code);
    }

    #[tokio::test]
    async fn test_configured_backing_asset_skips_rpc() {
        // the node knows no contracts, so any call would fail
        let node = MockEvmNode::new();
        let resolver = resolver(node);

        let configured = vault(Some(BackingAsset { contract_address: Some(ASSET.to_string()) }));
        assert_eq!(Some(ASSET.to_string()), resolver.resolve_asset_address(&configured).await.unwrap());

        let native = vault(Some(BackingAsset { contract_address: None }));
        assert_eq!(None, resolver.resolve_asset_address(&native).await.unwrap());
    }

    #[tokio::test]
    async fn test_vault_requires_address() {
        let mut account = vault(None);
        if let OnchainAccount::Vault(v) = &mut account {
            v.vault_address = String::new();
        }
        let err = resolver(MockEvmNode::new()).resolve_asset_address(&account).await.unwrap_err();
        assert_eq!("vault address is required", err.to_string());
    }

    #[tokio::test]
    async fn test_wrapped_token_resolves_base_token() {
        let wrapper = "0x4838B106FCe9647Bdf1E7877BF73cE8B0BAD5f97";
        let mut node = MockEvmNode::new();
        node.register_eth_call("baseToken", wrapper, &[], |_| MockRpcResult::Address(BASE_TOKEN.to_string()));

        let wrapped = OnchainAccount::Wrapped(WrappedToken {
            token: token(wrapper),
            base_token_address_function: "baseToken".to_string(),
        });
        let address = resolver(node).resolve_asset_address(&wrapped).await.unwrap();
        assert_eq!(Some(BASE_TOKEN.to_string()), address);
    }

    #[tokio::test]
    async fn test_wrapped_token_revert_is_an_error() {
        let wrapper = "0x4838B106FCe9647Bdf1E7877BF73cE8B0BAD5f97";
        let mut node = MockEvmNode::new();
        node.register_contract(wrapper);

        let wrapped = OnchainAccount::Wrapped(WrappedToken {
            token: token(wrapper),
            base_token_address_function: "baseToken".to_string(),
        });
        let err = resolver(node).resolve_asset_address(&wrapped).await.unwrap_err();
        assert!(err.rpc_error().unwrap().is_execution_reverted());
    }
}
