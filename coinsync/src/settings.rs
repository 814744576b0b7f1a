use coinledger::chain::{validate_url, RpcConfiguration};
use coinledger::errors::CoinLedgerError;
use coinledger::models::{BackingAsset, ChainAsset, Decimal, FungibleToken, OnchainAccount, TokenizedVault, WalletRef, WrappedToken};
use config::{Config, ConfigError, Environment, File};
use log::LevelFilter;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

const DEFAULT_CONFIG_PATH: &str = "conf/Settings";
const DEFAULT_LEDGER_URL: &str = "https://api.ynab.com/v1/";
const DEFAULT_QUOTE_URL: &str = "https://api.coingecko.com/api/v3/";
const DEFAULT_BALANCE_FUNCTION: &str = "balanceOf";

/// `backing_asset` value that prices a vault as the chain's native asset.
const NATIVE_BACKING_ASSET: &str = "native";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    #[default]
    Erc20,
    Erc4626,
    Erc20Wrapper,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AccountSettings {
    pub account_name: String,
    pub payee_name: String,
    pub transaction_category_name: String,
    pub wallet_address: String,
    pub chain_name: String,
    #[serde(default)]
    pub address_type: AddressType,
    pub token_address: Option<String>,
    pub vault_address: Option<String>,
    pub balance_function: Option<String>,
    pub backing_asset: Option<String>,
    pub base_token_address_function: Option<String>,
    pub fixed_price: Option<Decimal>, // overrides the quote source
}

impl AccountSettings {
    pub fn to_onchain_account(&self) -> Result<OnchainAccount, CoinLedgerError> {
        let chain = ChainAsset { chain_name: self.chain_name.clone() };
        let wallet = WalletRef { wallet_address: required(Some(&self.wallet_address), "wallet address")? };

        match self.address_type {
            AddressType::Erc20 => Ok(OnchainAccount::Fungible(FungibleToken {
                chain,
                wallet,
                token_address: required(self.token_address.as_deref(), "token address")?,
            })),
            AddressType::Erc4626 => {
                let backing_asset = self.backing_asset.as_ref().map(|asset| BackingAsset {
                    contract_address: if asset.eq_ignore_ascii_case(NATIVE_BACKING_ASSET) { None } else { Some(asset.clone()) },
                });
                Ok(OnchainAccount::Vault(TokenizedVault {
                    chain,
                    wallet,
                    vault_address: required(self.vault_address.as_deref(), "vault address")?,
                    share_balance_function: self.balance_function.clone()
                        .unwrap_or_else(|| DEFAULT_BALANCE_FUNCTION.to_string()),
                    backing_asset,
                }))
            }
            AddressType::Erc20Wrapper => Ok(OnchainAccount::Wrapped(WrappedToken {
                token: FungibleToken {
                    chain,
                    wallet,
                    token_address: required(self.token_address.as_deref(), "token address")?,
                },
                base_token_address_function: required(self.base_token_address_function.as_deref(), "base token address function name")?,
            })),
        }
    }
}

fn required(value: Option<&str>, name: &'static str) -> Result<String, CoinLedgerError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CoinLedgerError::MissingField(name)),
    }
}

/// `COINSYNC_CONFIG`, falling back to `conf/Settings` under the working directory.
pub fn config_path() -> String {
    if let Ok(path) = env::var("COINSYNC_CONFIG") {
        return path;
    }
    match env::current_dir() {
        Ok(mut dir) => {
            dir.push(DEFAULT_CONFIG_PATH);
            dir.to_string_lossy().into_owned()
        }
        Err(_) => String::from(DEFAULT_CONFIG_PATH),
    }
}

#[derive(Debug)]
pub struct Settings {
    pub budget_name: String,
    pub access_token: String,
    pub ledger_url: String,
    pub quote_url: String,
    pub proxy: Option<String>,
    pub log_level: Option<LevelFilter>,
    pub rpc_configurations: Vec<RpcConfiguration>,
    pub accounts: Vec<AccountSettings>,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("ledger_url", DEFAULT_LEDGER_URL)?
            .set_default("quote_url", DEFAULT_QUOTE_URL)?
            .add_source(File::with_name(path))
            // COINSYNC_ACCESS_TOKEN keeps the token out of the file
            .add_source(Environment::with_prefix("COINSYNC"))
            .build()?;

        let proxy = s.get_string("proxy").map(Some).unwrap_or(None);
        let log_level = match s.get_string("log_level") {
            Ok(level) => Some(LevelFilter::from_str(&level)
                .map_err(|_| ConfigError::Message(format!("invalid log_level '{}'", level)))?),
            Err(_) => None,
        };

        let rpc_configurations: Vec<RpcConfiguration> = s.get("rpc_configuration")?;
        if let Some(invalid) = rpc_configurations.iter().find(|c| !validate_url(&c.rpc_url)) {
            return Err(ConfigError::Message(format!(
                "invalid RPC URL '{}' for chain '{}'", invalid.rpc_url, invalid.chain_name
            )));
        }

        let accounts: Vec<AccountSettings> = s.get("account")?;

        Ok(Settings {
            budget_name: s.get_string("budget_name")?,
            access_token: s.get_string("access_token")?,
            ledger_url: s.get_string("ledger_url")?,
            quote_url: s.get_string("quote_url")?,
            proxy,
            log_level,
            rpc_configurations,
            accounts,
        })
    }
}
