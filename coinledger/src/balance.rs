use crate::errors::CoinLedgerError;
use crate::models::{FungibleToken, OnchainAccount, RawBalance, TokenizedVault};
use crate::rpc::{CallArgument, ContractCaller};
use log::debug;

const CONVERT_TO_ASSETS: &str = "convertToAssets";

/// Reads the raw on-chain balance behind an account.
pub struct BalanceFetcher {
    caller: ContractCaller,
}

impl BalanceFetcher {
    pub fn new(caller: ContractCaller) -> BalanceFetcher {
        BalanceFetcher { caller }
    }

    pub async fn fetch_balance(&self, account: &OnchainAccount) -> Result<RawBalance, CoinLedgerError> {
        match account {
            OnchainAccount::Fungible(token) => self.fetch_token_balance(token).await,
            OnchainAccount::Vault(vault) => self.fetch_vault_balance(vault).await,
            // the wrapper's own balance is reported, not the unwrapped amount
            OnchainAccount::Wrapped(wrapped) => self.fetch_token_balance(&wrapped.token).await,
        }
    }

    async fn fetch_token_balance(&self, token: &FungibleToken) -> Result<RawBalance, CoinLedgerError> {
        if token.token_address.is_empty() {
            return Err(CoinLedgerError::MissingField("token address"));
        }
        let node_url = self.caller.node_url(&token.chain)?;
        let wallet = CallArgument::Address(token.wallet.wallet_address.clone());
        self.caller.call_uint(&node_url, &token.token_address, "balanceOf", Some(&wallet)).await
    }

    /// Share balance first, then `convertToAssets(shares)`. A vault without
    /// `convertToAssets` is an error, not an empty balance.
    async fn fetch_vault_balance(&self, vault: &TokenizedVault) -> Result<RawBalance, CoinLedgerError> {
        if vault.vault_address.is_empty() {
            return Err(CoinLedgerError::MissingField("vault address"));
        }
        let node_url = self.caller.node_url(&vault.chain)?;

        let wallet = CallArgument::Address(vault.wallet.wallet_address.clone());
        let shares = self.caller.call_uint(&node_url, &vault.vault_address, &vault.share_balance_function, Some(&wallet)).await?;
        debug!("{} holds {} shares of vault {}", vault.wallet.wallet_address, shares, vault.vault_address);

        let shares = CallArgument::Uint256(shares);
        self.caller.call_uint(&node_url, &vault.vault_address, CONVERT_TO_ASSETS, Some(&shares)).await
    }
}
