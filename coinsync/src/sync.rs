use coinledger::asset::AssetResolver;
use coinledger::balance::BalanceFetcher;
use coinledger::chain::DefaultConfigurationResolver;
use coinledger::decimals::{DecimalsResolver, RpcDecimalsResolver};
use coinledger::fiat::{as_fiat, to_milliunits};
use coinledger::http::{build_client, Doer};
use coinledger::models::{AssetAddress, Decimal, OnchainAccount, Quote};
use coinledger::rpc::ContractCaller;
use chrono::{DateTime, Local, SecondsFormat, TimeZone};
use log::{debug, info};
use std::fmt;
use std::sync::Arc;

use crate::clients::coingecko::{platform_for_chain_id, HttpQuoteResolver, QuoteResolver};
use crate::clients::ynab::{find_account, find_budget, find_category_id, LedgerClient, YnabClient};
use crate::clients::ynab_models::SaveTransaction;
use crate::errors::SyncError;
use crate::settings::{AccountSettings, Settings};

/// Net change written to one ledger account, in milliunits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeSummary {
    pub account_name: String,
    pub milliunits: i64,
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // sub-cent milliunits are dropped
        write!(f, "{}: ${}", self.account_name, Decimal::new(self.milliunits / 10, 2))
    }
}

/// Ledger date and memo for an adjustment made at `now`. The date is the day in `now`'s own zone.
fn adjustment_stamp<Tz: TimeZone>(now: &DateTime<Tz>) -> (String, String)
where
    Tz::Offset: fmt::Display,
{
    (
        now.format("%Y-%m-%d").to_string(),
        format!("Balance adjustment executed {}", now.to_rfc3339_opts(SecondsFormat::Secs, true)),
    )
}

pub struct Syncer {
    ledger: Box<dyn LedgerClient>,
    quotes: Box<dyn QuoteResolver>,
    decimals: Box<dyn DecimalsResolver>,
    balances: BalanceFetcher,
    assets: AssetResolver,
    caller: ContractCaller,
}

impl Syncer {
    pub fn new(ledger: Box<dyn LedgerClient>, quotes: Box<dyn QuoteResolver>, decimals: Box<dyn DecimalsResolver>, caller: ContractCaller) -> Syncer {
        Syncer {
            ledger,
            quotes,
            decimals,
            balances: BalanceFetcher::new(caller.clone()),
            assets: AssetResolver::new(caller.clone()),
            caller,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Syncer, SyncError> {
        let doer: Arc<dyn Doer> = Arc::new(build_client(settings.proxy.as_deref())?);
        let resolver = Arc::new(DefaultConfigurationResolver::new(settings.rpc_configurations.clone()));
        let caller = ContractCaller::new(resolver, doer.clone());

        Ok(Syncer::new(
            Box::new(YnabClient::new(doer.clone(), &settings.ledger_url, &settings.access_token)?),
            Box::new(HttpQuoteResolver::new(doer, &settings.quote_url)?),
            Box::new(RpcDecimalsResolver::new(caller.clone())),
            caller,
        ))
    }

    /// Brings every configured account in line with its on-chain value, stopping at the first failure.
    pub async fn run(&self, budget_name: &str, accounts: &[AccountSettings]) -> Result<Vec<ChangeSummary>, SyncError> {
        let budgets = self.ledger.list_budgets().await?;
        let budget = find_budget(&budgets, budget_name)?;
        let category_groups = self.ledger.list_categories(&budget.id).await?;
        let ledger_accounts = self.ledger.list_accounts(&budget.id).await?;
        if ledger_accounts.is_empty() {
            return Err(SyncError::Ledger(String::from("no accounts found in budget")));
        }

        let mut summaries = Vec::with_capacity(accounts.len());
        for account in accounts {
            let category_id = find_category_id(&category_groups, &account.transaction_category_name)
                .ok_or_else(|| SyncError::CategoryNotFound {
                    category: account.transaction_category_name.clone(),
                    account: account.account_name.clone(),
                })?;

            let onchain = account.to_onchain_account()?;
            let onchain_milliunits = self.value_account(account, &onchain).await?;

            let ledger_account = find_account(&ledger_accounts, &account.account_name)?;
            let diff = onchain_milliunits.checked_sub(ledger_account.balance)
                .ok_or_else(|| SyncError::AmountOutOfRange(format!("difference for account '{}'", account.account_name)))?;

            if diff != 0 {
                let (date, memo) = adjustment_stamp(&Local::now());
                let transaction = SaveTransaction {
                    account_id: ledger_account.id.clone(),
                    date,
                    amount: diff,
                    payee_name: account.payee_name.clone(),
                    category_id: category_id.to_string(),
                    memo,
                };
                self.ledger.create_transaction(&budget.id, transaction).await?;
            }

            let summary = ChangeSummary {
                account_name: account.account_name.clone(),
                milliunits: diff,
            };
            info!("{}", summary);
            summaries.push(summary);
        }
        Ok(summaries)
    }

    /// On-chain value of the account in ledger milliunits.
    async fn value_account(&self, account: &AccountSettings, onchain: &OnchainAccount) -> Result<i64, SyncError> {
        let balance = self.balances.fetch_balance(onchain).await?;
        let asset_address = self.assets.resolve_asset_address(onchain).await?;
        let decimals = self.decimals.resolve_decimals(onchain.chain(), asset_address.clone()).await?;
        let quote = self.resolve_quote(account, onchain, &asset_address).await?;
        debug!("{}: balance {} with {} decimals at {:?}", account.account_name, balance, decimals, quote);

        let cents = as_fiat(&balance, decimals, &quote);
        to_milliunits(&cents)
            .map_err(|_| SyncError::AmountOutOfRange(format!("{} cents for account '{}'", cents, account.account_name)))
    }

    async fn resolve_quote(&self, account: &AccountSettings, onchain: &OnchainAccount, asset_address: &AssetAddress) -> Result<Quote, SyncError> {
        if let Some(price) = account.fixed_price {
            return Ok(Quote::from_decimal(price)?);
        }
        let contract_address = match asset_address {
            None => return self.quotes.resolve_native_quote().await,
            Some(address) => address,
        };

        let chain_id = self.caller.chain_id(onchain.chain()).await?;
        let platform = platform_for_chain_id(&chain_id)?;
        self.quotes.resolve_quote(platform, contract_address).await?
            .ok_or_else(|| SyncError::QuoteNotFound {
                account: account.account_name.clone(),
                platform: platform.to_string(),
                contract: contract_address.clone(),
            })
    }
}
