use coinledger::errors::CoinLedgerError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Core(#[from] CoinLedgerError),

    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("failed to set up logging: {0}")]
    Logger(#[from] fern::InitError),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported chain ID value: {0}")]
    UnsupportedChainId(String),

    #[error("malformed quote: {0}")]
    Quote(String),

    #[error("no quote found for {contract} on '{platform}'; set fixed_price for account '{account}' to price it manually")]
    QuoteNotFound {
        account: String,
        platform: String,
        contract: String,
    },

    #[error("no category '{category}' found in budget for account '{account}'")]
    CategoryNotFound { category: String, account: String },

    #[error("ledger error: {0}")]
    Ledger(String),

    #[error("amount out of range: {0}")]
    AmountOutOfRange(String),
}
