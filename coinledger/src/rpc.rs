use crate::chain::{resolve_rpc_url, ChainFamily, ConfigurationResolver};
use crate::errors::{CoinLedgerError, RpcError};
use crate::http::{Doer, HttpRequest};
use crate::models::ChainAsset;
use log::{debug, trace};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha3::{Digest, Keccak256};
use std::sync::Arc;

const JSON_RPC_VERSION: &str = "2.0";

/// Hex characters in one 32-byte ABI word.
const WORD_HEX_LENGTH: usize = 64;
const ADDRESS_HEX_LENGTH: usize = 40;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Request {
    pub id: u64,
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
}

impl Request {
    pub fn new(method: &str, params: Vec<Value>) -> Request {
        Request {
            id: 1,
            jsonrpc: String::from(JSON_RPC_VERSION),
            method: String::from(method),
            params,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct ResponseError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Response {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

/// The single scalar argument an `eth_call` may carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArgument {
    Address(String),
    Uint256(BigUint),
}

impl CallArgument {
    pub fn type_name(&self) -> &'static str {
        match self {
            CallArgument::Address(_) => "address",
            CallArgument::Uint256(_) => "uint256",
        }
    }
}

/// `0x` + first four bytes of keccak256 over the canonical signature.
pub fn function_selector(signature: &str) -> String {
    let mut hasher = Keccak256::new();
    hasher.update(signature.as_bytes());
    let digest = hasher.finalize();
    format!("0x{}", hex::encode(&digest[..4]))
}

/// Encodes the argument as one left-zero-padded 32-byte word, without `0x`.
pub fn encode_argument(argument: &CallArgument) -> Result<String, CoinLedgerError> {
    match argument {
        CallArgument::Address(address) => {
            let digits = strip_hex_prefix(address);
            if digits.len() != ADDRESS_HEX_LENGTH || hex::decode(digits).is_err() {
                return Err(CoinLedgerError::InvalidArgument(format!("'{}' is not a 20-byte address", address)));
            }
            Ok(format!("{:0>64}", digits))
        }
        CallArgument::Uint256(value) => {
            let digits = value.to_str_radix(16);
            if digits.len() > WORD_HEX_LENGTH {
                return Err(CoinLedgerError::Overflow(format!("{} exceeds uint256", value)));
            }
            Ok(format!("{:0>64}", digits))
        }
    }
}

fn strip_hex_prefix(value: &str) -> &str {
    value.strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Parses a hex quantity, with or without `0x`, at arbitrary precision.
pub fn decode_uint(value: &str) -> Result<BigUint, CoinLedgerError> {
    let digits = strip_hex_prefix(value.trim());
    if digits.is_empty() {
        return Err(CoinLedgerError::EmptyResult);
    }
    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| CoinLedgerError::InvalidHex(value.to_string()))
}

/// `0x`-prefixed minimal hex, `0x0` for zero.
pub fn encode_uint(value: &BigUint) -> String {
    if value.is_zero() {
        return String::from("0x0");
    }
    format!("0x{}", value.to_str_radix(16))
}

/// Drops the 12 bytes of left padding from an address-typed return word.
pub fn strip_address_padding(word: &str) -> Result<String, CoinLedgerError> {
    let digits = strip_hex_prefix(word.trim());
    if digits.len() < ADDRESS_HEX_LENGTH || hex::decode(digits).is_err() {
        return Err(CoinLedgerError::InvalidHex(word.to_string()));
    }
    let (padding, address) = digits.split_at(digits.len() - ADDRESS_HEX_LENGTH);
    if padding.chars().any(|c| c != '0') {
        return Err(CoinLedgerError::InvalidHex(word.to_string()));
    }
    Ok(format!("0x{}", address))
}

/// Posts one JSON-RPC request and returns its `result`.
pub async fn execute_request(doer: &dyn Doer, node_url: &str, request: &Request) -> Result<String, CoinLedgerError> {
    trace!("rpc {} -> {}", request.method, node_url);
    let body = serde_json::to_string(request)?;
    let response = doer.execute(HttpRequest::post_json(node_url, body)).await?
        .expect_ok()?;
    trace!("body:{}", &response.body);

    let rpc_response: Response = serde_json::from_str(&response.body)?;
    if let Some(err) = rpc_response.error {
        if err.code != 0 {
            debug!("{} failed with code {}: {}", request.method, err.code, err.message);
            return Err(CoinLedgerError::Rpc(RpcError { code: err.code, message: err.message }));
        }
    }
    rpc_response.result.ok_or(CoinLedgerError::EmptyResult)
}

/// Calls `function_name` on `contract_address` at the latest block.
pub async fn eth_call(doer: &dyn Doer, node_url: &str, contract_address: &str, function_name: &str, argument: Option<&CallArgument>) -> Result<String, CoinLedgerError> {
    let arg_type = argument.map(|a| a.type_name()).unwrap_or("");
    let mut data = function_selector(&format!("{}({})", function_name, arg_type));
    if let Some(arg) = argument {
        data.push_str(&encode_argument(arg)?);
    }

    let request = Request::new("eth_call", vec![
        json!({"to": contract_address, "data": data}),
        json!("latest"),
    ]);
    execute_request(doer, node_url, &request).await
        .map_err(|err| err.in_call(function_name, contract_address))
}

pub async fn fetch_chain_id(doer: &dyn Doer, node_url: &str) -> Result<BigUint, CoinLedgerError> {
    let request = Request::new("eth_chainId", vec![]);
    let result = execute_request(doer, node_url, &request).await?;
    decode_uint(&result)
}


/// Resolves the node for an account's chain and issues contract calls against it.
#[derive(Clone)]
pub struct ContractCaller {
    resolver: Arc<dyn ConfigurationResolver>,
    doer: Arc<dyn Doer>,
}

impl ContractCaller {
    pub fn new(resolver: Arc<dyn ConfigurationResolver>, doer: Arc<dyn Doer>) -> ContractCaller {
        ContractCaller { resolver, doer }
    }

    pub fn node_url(&self, chain: &ChainAsset) -> Result<String, CoinLedgerError> {
        resolve_rpc_url(self.resolver.as_ref(), chain, ChainFamily::Evm)
    }

    pub async fn call(&self, node_url: &str, contract_address: &str, function_name: &str, argument: Option<&CallArgument>) -> Result<String, CoinLedgerError> {
        eth_call(self.doer.as_ref(), node_url, contract_address, function_name, argument).await
    }

    pub async fn call_uint(&self, node_url: &str, contract_address: &str, function_name: &str, argument: Option<&CallArgument>) -> Result<BigUint, CoinLedgerError> {
        let result = self.call(node_url, contract_address, function_name, argument).await?;
        decode_uint(&result).map_err(|err| err.in_call(function_name, contract_address))
    }

    pub async fn chain_id(&self, chain: &ChainAsset) -> Result<BigUint, CoinLedgerError> {
        let node_url = self.node_url(chain)?;
        fetch_chain_id(self.doer.as_ref(), &node_url).await
    }
}
