//! A scripted EVM node for tests. Contract calls are answered by (contract, selector);
//! an unknown contract answers `0x` and an unknown function reverts with `-32000`.

use crate::errors::{CoinLedgerError, EXECUTION_REVERTED};
use crate::http::{Doer, HttpRequest, HttpResponse};
use crate::rpc::{encode_uint, function_selector, Request, Response, ResponseError};
use async_trait::async_trait;
use num_bigint::BigUint;
use serde_json::Value;
use std::collections::HashMap;

pub const NODE_URL: &str = "http://node.localhost/rpc";

/// Length of `0x` + selector at the front of the call data.
const SELECTOR_LENGTH: usize = 10;

pub enum MockRpcResult {
    Address(String),
    Number(BigUint),
    Raw(String),
    Error { code: i64, message: String },
}

impl MockRpcResult {
    pub fn reverted() -> MockRpcResult {
        MockRpcResult::Error { code: EXECUTION_REVERTED, message: "execution reverted".to_string() }
    }

    fn into_response(self) -> Response {
        let (result, error) = match self {
            MockRpcResult::Address(address) => {
                (Some(format!("0x000000000000000000000000{}", address.trim_start_matches("0x"))), None)
            }
            MockRpcResult::Number(number) => (Some(encode_uint(&number)), None),
            MockRpcResult::Raw(raw) => (Some(raw), None),
            MockRpcResult::Error { code, message } => (None, Some(ResponseError { code, message })),
        };
        Response {
            id: Value::from(1),
            jsonrpc: "2.0".to_string(),
            result,
            error,
        }
    }
}

/// Receives the encoded argument word (64 hex chars) when the call has one.
type CallHandler = Box<dyn Fn(Option<&str>) -> MockRpcResult + Send + Sync>;
type MethodHandler = Box<dyn Fn() -> MockRpcResult + Send + Sync>;

#[derive(Default)]
pub struct MockEvmNode {
    method_handlers: HashMap<String, MethodHandler>,
    // contract address -> selector -> handler
    call_handlers: HashMap<String, HashMap<String, CallHandler>>,
}

impl MockEvmNode {
    pub fn new() -> MockEvmNode {
        MockEvmNode::default()
    }

    /// Makes the contract known without any functions, so every call reverts.
    pub fn register_contract(&mut self, address: &str) {
        self.call_handlers.entry(address.to_string()).or_default();
    }

    /// Answers a non-`eth_call` method such as `eth_chainId`.
    pub fn register_rpc_method<F>(&mut self, method: &str, handler: F)
    where
        F: Fn() -> MockRpcResult + Send + Sync + 'static,
    {
        self.method_handlers.insert(method.to_string(), Box::new(handler));
    }

    pub fn register_eth_call<F>(&mut self, function_name: &str, contract_address: &str, parameter_types: &[&str], handler: F)
    where
        F: Fn(Option<&str>) -> MockRpcResult + Send + Sync + 'static,
    {
        let selector = function_selector(&format!("{}({})", function_name, parameter_types.join(",")));
        self.call_handlers.entry(contract_address.to_string())
            .or_default()
            .insert(selector, Box::new(handler));
    }

    fn answer(&self, request: &Request) -> Result<Response, CoinLedgerError> {
        if let Some(handler) = self.method_handlers.get(&request.method) {
            return Ok(handler().into_response());
        }
        if request.method != "eth_call" || request.params.len() != 2 {
            return Err(CoinLedgerError::InvalidArgument(format!("unexpected request {:?}", request)));
        }

        let call = &request.params[0];
        let to = call["to"].as_str().unwrap_or_default();
        let data = call["data"].as_str().unwrap_or_default();
        let handlers = match self.call_handlers.get(to) {
            None => return Ok(MockRpcResult::Raw("0x".to_string()).into_response()),
            Some(handlers) => handlers,
        };
        if data.len() < SELECTOR_LENGTH {
            return Err(CoinLedgerError::InvalidArgument(format!("call data too short: {}", data)));
        }

        let (selector, argument) = data.split_at(SELECTOR_LENGTH);
        let result = match handlers.get(selector) {
            None => MockRpcResult::reverted(),
            Some(handler) => handler(if argument.is_empty() { None } else { Some(argument) }),
        };
        Ok(result.into_response())
    }
}

#[async_trait]
impl Doer for MockEvmNode {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, CoinLedgerError> {
        if request.url != NODE_URL {
            return Ok(HttpResponse { status: 404, body: format!("no node at {}", request.url) });
        }
        let rpc_request: Request = serde_json::from_str(request.body.as_deref().unwrap_or_default())?;
        let response = self.answer(&rpc_request)?;
        Ok(HttpResponse::ok(&serde_json::to_string(&response)?))
    }
}
