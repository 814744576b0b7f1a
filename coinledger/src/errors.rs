use crate::chain::ChainFamily;
use std::fmt;

/// JSON-RPC code a node answers with when a call reverts.
pub const EXECUTION_REVERTED: i64 = -32000;

/// An error envelope returned by the node in place of a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    /// `-32000` is also what a node returns when the contract has no such function,
    /// so callers that probe optional accessors treat it as "function absent".
    pub fn is_execution_reverted(&self) -> bool {
        self.code == EXECUTION_REVERTED
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RPC error: code {}, message: '{}'", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

#[derive(Debug, thiserror::Error)]
pub enum CoinLedgerError {
    #[error("no RPC configuration found for chain '{0}'")]
    ChainNotFound(String),

    #[error("RPC configuration for chain '{chain}' is of type '{actual}', not the required type of '{required}'")]
    ChainFamilyMismatch {
        chain: String,
        required: ChainFamily,
        actual: ChainFamily,
    },

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response status code ({status}); first {limit} bytes of body are: '{body}'", limit = crate::utils::BODY_SAMPLE_LIMIT)]
    UnexpectedStatus { status: u16, body: String },

    #[error("failed to unmarshal response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid hex value '{0}'")]
    InvalidHex(String),

    #[error("node returned an empty result")]
    EmptyResult,

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("failed to execute {function} on {contract}: {source}")]
    Call {
        function: String,
        contract: String,
        #[source]
        source: Box<CoinLedgerError>,
    },

    #[error("value does not fit: {0}")]
    Overflow(String),
}

impl CoinLedgerError {
    /// The RPC envelope behind this error, looking through any call context.
    pub fn rpc_error(&self) -> Option<&RpcError> {
        match self {
            CoinLedgerError::Rpc(err) => Some(err),
            CoinLedgerError::Call { source, .. } => source.rpc_error(),
            _ => None,
        }
    }

    pub(crate) fn in_call(self, function: &str, contract: &str) -> CoinLedgerError {
        CoinLedgerError::Call {
            function: function.to_string(),
            contract: contract.to_string(),
            source: Box::new(self),
        }
    }
}
