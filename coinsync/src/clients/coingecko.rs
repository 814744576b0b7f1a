use async_trait::async_trait;
use coinledger::errors::CoinLedgerError;
use coinledger::http::{Doer, HttpRequest};
use coinledger::models::{Decimal, Quote};
#[cfg(test)]
use mockall::automock;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::Deserialize;
use serde_json::Number;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

use crate::errors::SyncError;

const NATIVE_COIN_ID: &str = "ethereum";
const VS_CURRENCY: &str = "usd";

enum API {
    SimplePrice,
    ContractCoin { platform_id: String, contract_address: String },
}

impl From<API> for String {
    fn from(api: API) -> Self {
        match api {
            API::SimplePrice => String::from("simple/price"),
            API::ContractCoin { platform_id, contract_address } => {
                format!("coins/{}/contract/{}", platform_id, contract_address)
            }
        }
    }
}

/// CoinGecko asset platform for an EVM chain ID.
pub fn platform_for_chain_id(chain_id: &BigUint) -> Result<&'static str, SyncError> {
    let id = chain_id.to_i64()
        .ok_or_else(|| SyncError::UnsupportedChainId(chain_id.to_string()))?;
    match id {
        1 => Ok("ethereum"),
        137 => Ok("polygon-pos"),
        8453 => Ok("base"),
        42161 => Ok("arbitrum-one"),
        43114 => Ok("avalanche"),
        _ => Err(SyncError::UnsupportedChainId(id.to_string())),
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuoteResolver: Send + Sync {
    /// Price of the native asset; a missing price is an error.
    async fn resolve_native_quote(&self) -> Result<Quote, SyncError>;

    /// `Ok(None)` when the platform does not know the contract or has no USD price for it.
    async fn resolve_quote(&self, platform_id: &str, contract_address: &str) -> Result<Option<Quote>, SyncError>;
}

#[derive(Debug, Deserialize)]
struct CoinDetailsResponse {
    market_data: Option<MarketData>,
}

#[derive(Debug, Deserialize)]
struct MarketData {
    current_price: Option<HashMap<String, Number>>,
}

pub struct HttpQuoteResolver {
    doer: Arc<dyn Doer>,
    base_url: Url,
}

impl HttpQuoteResolver {
    pub fn new(doer: Arc<dyn Doer>, base_url: &str) -> Result<HttpQuoteResolver, SyncError> {
        Ok(HttpQuoteResolver {
            doer,
            base_url: Url::parse(base_url)?,
        })
    }

    fn url(&self, api: API) -> Result<Url, SyncError> {
        Ok(self.base_url.join(&String::from(api))?)
    }
}

#[async_trait]
impl QuoteResolver for HttpQuoteResolver {
    async fn resolve_native_quote(&self) -> Result<Quote, SyncError> {
        let mut url = self.url(API::SimplePrice)?;
        url.query_pairs_mut()
            .append_pair("ids", NATIVE_COIN_ID)
            .append_pair("vs_currencies", VS_CURRENCY)
            .append_pair("precision", "full");

        let response = self.doer.execute(HttpRequest::get(url.as_str())).await?.expect_ok()?;
        let prices: HashMap<String, HashMap<String, Number>> = serde_json::from_str(&response.body)
            .map_err(CoinLedgerError::from)?;

        let price = prices.get(NATIVE_COIN_ID)
            .ok_or_else(|| SyncError::Quote(format!("{} not returned in response", NATIVE_COIN_ID)))?
            .get(VS_CURRENCY)
            .ok_or_else(|| SyncError::Quote(format!("USD price not found in {} prices", NATIVE_COIN_ID)))?;
        parse_price(price)
    }

    async fn resolve_quote(&self, platform_id: &str, contract_address: &str) -> Result<Option<Quote>, SyncError> {
        let url = self.url(API::ContractCoin {
            platform_id: platform_id.to_string(),
            contract_address: contract_address.to_string(),
        })?;

        let response = self.doer.execute(HttpRequest::get(url.as_str())).await?;
        if response.status == 404 {
            return Ok(None);
        }
        let response = response.expect_ok()?;
        let details: CoinDetailsResponse = serde_json::from_str(&response.body)
            .map_err(CoinLedgerError::from)?;

        let price = details.market_data
            .and_then(|m| m.current_price)
            .and_then(|mut prices| prices.remove(VS_CURRENCY));
        match price {
            None => Ok(None),
            Some(price) => parse_price(&price).map(Some),
        }
    }
}

/// Reads the price from its JSON text so no precision is lost to f64.
fn parse_price(price: &Number) -> Result<Quote, SyncError> {
    let text = price.to_string();
    let decimal = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| SyncError::Quote(format!("failed to parse USD price '{}'", text)))?;
    Ok(Quote::from_decimal(decimal)?)
}
