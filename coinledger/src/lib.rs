pub mod errors;
pub mod models;
pub mod utils;

pub mod http;
pub mod rpc;
pub mod chain;

pub mod balance;
pub mod asset;
pub mod decimals;
pub mod fiat;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;
