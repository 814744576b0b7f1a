use crate::errors::CoinLedgerError;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::Deserialize;

/// Smallest on-chain unit, no decimals applied.
pub type RawBalance = BigUint;

pub type Decimal = rust_decimal::Decimal;

/// Native assets (ETH) have no contract address; `None` asks for native pricing.
pub type AssetAddress = Option<String>;

pub const NATIVE_ASSET_DECIMALS: u32 = 18;


/// Which RPC configuration governs an account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ChainAsset {
    pub chain_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct WalletRef {
    pub wallet_address: String,
}


/// A standard token held directly by the wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FungibleToken {
    pub chain: ChainAsset,
    pub wallet: WalletRef,
    pub token_address: String,
}

/// Pricing override for a vault. `contract_address == None` prices the vault as the native asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackingAsset {
    pub contract_address: Option<String>,
}

/// Vault whose shares are converted to the underlying asset through `convertToAssets`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenizedVault {
    pub chain: ChainAsset,
    pub wallet: WalletRef,
    pub vault_address: String,
    pub share_balance_function: String,
    pub backing_asset: Option<BackingAsset>,
}

/// A wrapper whose balance is read as-is but whose price comes from the wrapped token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrappedToken {
    pub token: FungibleToken,
    pub base_token_address_function: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OnchainAccount {
    Fungible(FungibleToken),
    Vault(TokenizedVault),
    Wrapped(WrappedToken),
}

impl OnchainAccount {
    pub fn chain(&self) -> &ChainAsset {
        match self {
            OnchainAccount::Fungible(token) => &token.chain,
            OnchainAccount::Vault(vault) => &vault.chain,
            OnchainAccount::Wrapped(wrapped) => &wrapped.token.chain,
        }
    }

    pub fn wallet(&self) -> &WalletRef {
        match self {
            OnchainAccount::Fungible(token) => &token.wallet,
            OnchainAccount::Vault(vault) => &vault.wallet,
            OnchainAccount::Wrapped(wrapped) => &wrapped.token.wallet,
        }
    }

    /// The contract the balance is read from.
    pub fn contract_address(&self) -> &str {
        match self {
            OnchainAccount::Fungible(token) => &token.token_address,
            OnchainAccount::Vault(vault) => &vault.vault_address,
            OnchainAccount::Wrapped(wrapped) => &wrapped.token.token_address,
        }
    }
}


/// A market price split into whole dollars and the sub-dollar part as a ratio,
/// so tokens worth less than a cent still carry value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quote {
    pub whole_dollars: u64,
    pub cents_ratio: f64,
}

impl Quote {
    pub fn new(whole_dollars: u64, cents_ratio: f64) -> Quote {
        Quote { whole_dollars, cents_ratio }
    }

    /// Splits an exact decimal price. Negative prices are rejected.
    pub fn from_decimal(price: Decimal) -> Result<Quote, CoinLedgerError> {
        if price.is_sign_negative() {
            return Err(CoinLedgerError::InvalidArgument(format!("negative price {}", price)));
        }
        let whole_dollars = price.trunc().to_u64()
            .ok_or_else(|| CoinLedgerError::Overflow(format!("price {} in whole dollars", price)))?;
        let cents_ratio = price.fract().to_f64()
            .ok_or_else(|| CoinLedgerError::Overflow(format!("fraction of price {}", price)))?;
        Ok(Quote { whole_dollars, cents_ratio })
    }
}
