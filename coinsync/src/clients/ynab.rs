use async_trait::async_trait;
use coinledger::errors::CoinLedgerError;
use coinledger::http::{Doer, HttpRequest};
use coinledger::utils::body_sample;
use log::trace;
#[cfg(test)]
use mockall::automock;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

use crate::clients::ynab_models::{
    Account, AccountsData, BudgetSummary, BudgetsData, CategoriesData, CategoryGroup, Envelope, ErrorResponse,
    SaveTransaction, SaveTransactionWrapper,
};
use crate::errors::SyncError;

enum API {
    Budgets,
    Accounts(String),
    Categories(String),
    Transactions(String),
}

impl From<API> for String {
    fn from(api: API) -> Self {
        match api {
            API::Budgets => String::from("budgets"),
            API::Accounts(budget_id) => format!("budgets/{}/accounts", budget_id),
            API::Categories(budget_id) => format!("budgets/{}/categories", budget_id),
            API::Transactions(budget_id) => format!("budgets/{}/transactions", budget_id),
        }
    }
}

/// The budgeting ledger the on-chain balances are reconciled into.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn list_budgets(&self) -> Result<Vec<BudgetSummary>, SyncError>;
    async fn list_accounts(&self, budget_id: &str) -> Result<Vec<Account>, SyncError>;
    async fn list_categories(&self, budget_id: &str) -> Result<Vec<CategoryGroup>, SyncError>;
    async fn create_transaction(&self, budget_id: &str, transaction: SaveTransaction) -> Result<(), SyncError>;
}

fn sorted_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let mut names: Vec<&str> = names.collect();
    names.sort();
    names.join("', '")
}

pub fn find_budget<'a>(budgets: &'a [BudgetSummary], name: &str) -> Result<&'a BudgetSummary, SyncError> {
    if budgets.is_empty() {
        return Err(SyncError::Ledger(String::from("no budgets found")));
    }
    budgets.iter()
        .find(|b| b.name == name)
        .ok_or_else(|| SyncError::Ledger(format!(
            "budget '{}' not found; available budget(s) are: ['{}']",
            name, sorted_names(budgets.iter().map(|b| b.name.as_str()))
        )))
}

pub fn find_account<'a>(accounts: &'a [Account], name: &str) -> Result<&'a Account, SyncError> {
    let open = || accounts.iter().filter(|a| !a.deleted);
    open().find(|a| a.name == name)
        .ok_or_else(|| SyncError::Ledger(format!(
            "no account found for name '{}'; available accounts are: ['{}']",
            name, sorted_names(open().map(|a| a.name.as_str()))
        )))
}

pub fn find_category_id<'a>(groups: &'a [CategoryGroup], name: &str) -> Option<&'a str> {
    groups.iter()
        .flat_map(|g| g.categories.iter())
        .find(|c| c.name == name)
        .map(|c| c.id.as_str())
}

pub struct YnabClient {
    doer: Arc<dyn Doer>,
    base_url: Url,
    access_token: String,
}

impl YnabClient {
    pub fn new(doer: Arc<dyn Doer>, base_url: &str, access_token: &str) -> Result<YnabClient, SyncError> {
        Ok(YnabClient {
            doer,
            base_url: Url::parse(base_url)?,
            access_token: access_token.to_string(),
        })
    }

    fn url(&self, api: API) -> Result<Url, SyncError> {
        Ok(self.base_url.join(&String::from(api))?)
    }

    async fn send(&self, request: HttpRequest) -> Result<String, SyncError> {
        let request = request.header("Authorization", &format!("Bearer {}", self.access_token));
        trace!("ledger {} {}", request.method, request.url);
        let response = self.doer.execute(request).await?;
        if !(200..300).contains(&response.status) {
            let detail = match serde_json::from_str::<ErrorResponse>(&response.body) {
                Ok(err) => format!("{} ({}): {}", err.error.name, err.error.id, err.error.detail),
                Err(_) => body_sample(&response.body),
            };
            return Err(SyncError::Ledger(format!("unexpected status {}: {}", response.status, detail)));
        }
        Ok(response.body)
    }

    async fn get<T: DeserializeOwned>(&self, api: API) -> Result<T, SyncError> {
        let url = self.url(api)?;
        let body = self.send(HttpRequest::get(url.as_str())).await?;
        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(CoinLedgerError::from)?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl LedgerClient for YnabClient {
    async fn list_budgets(&self) -> Result<Vec<BudgetSummary>, SyncError> {
        let data: BudgetsData = self.get(API::Budgets).await?;
        Ok(data.budgets)
    }

    async fn list_accounts(&self, budget_id: &str) -> Result<Vec<Account>, SyncError> {
        let data: AccountsData = self.get(API::Accounts(budget_id.to_string())).await?;
        Ok(data.accounts)
    }

    async fn list_categories(&self, budget_id: &str) -> Result<Vec<CategoryGroup>, SyncError> {
        let data: CategoriesData = self.get(API::Categories(budget_id.to_string())).await?;
        Ok(data.category_groups)
    }

    async fn create_transaction(&self, budget_id: &str, transaction: SaveTransaction) -> Result<(), SyncError> {
        let url = self.url(API::Transactions(budget_id.to_string()))?;
        let body = serde_json::to_string(&SaveTransactionWrapper { transaction })
            .map_err(CoinLedgerError::from)?;
        self.send(HttpRequest::post_json(url.as_str(), body)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ynab_models::Category;
    use coinledger::http::{HttpResponse, MockDoer};

    const BASE_URL: &str = "https://api.ynab.com/v1/";

    fn client(doer: MockDoer) -> YnabClient {
        YnabClient::new(Arc::new(doer), BASE_URL, "token-123").unwrap()
    }

    fn has_bearer(request: &HttpRequest) -> bool {
        request.headers.contains(&("Authorization".to_string(), "Bearer token-123".to_string()))
    }

    #[tokio::test]
    async fn test_list_budgets() {
        let mut doer = MockDoer::new();
        doer.expect_execute()
            .times(1)
            .withf(|request| request.url == "https://api.ynab.com/v1/budgets" && has_bearer(request))
            .returning(|_| Ok(HttpResponse::ok(r#"{"data":{"budgets":[{"id":"b-1","name":"Crypto","last_modified_on":"2024-01-01T00:00:00Z"}]}}"#)));

        let budgets = client(doer).list_budgets().await.unwrap();
        assert_eq!(vec![BudgetSummary { id: "b-1".to_string(), name: "Crypto".to_string() }], budgets);
    }

    #[tokio::test]
    async fn test_list_accounts_and_categories() {
        let mut doer = MockDoer::new();
        doer.expect_execute()
            .withf(|request| request.url == "https://api.ynab.com/v1/budgets/b-1/accounts")
            .returning(|_| Ok(HttpResponse::ok(r#"{"data":{"accounts":[{"id":"a-1","name":"USDC","balance":-1500,"closed":false,"deleted":false}],"server_knowledge":4}}"#)));
        doer.expect_execute()
            .withf(|request| request.url == "https://api.ynab.com/v1/budgets/b-1/categories")
            .returning(|_| Ok(HttpResponse::ok(r#"{"data":{"category_groups":[{"id":"g-1","name":"Savings","categories":[{"id":"c-1","name":"Investments"}]}]}}"#)));

        let client = client(doer);
        let accounts = client.list_accounts("b-1").await.unwrap();
        assert_eq!(-1500, accounts[0].balance);

        let groups = client.list_categories("b-1").await.unwrap();
        assert_eq!(Some("c-1"), find_category_id(&groups, "Investments"));
        assert_eq!(None, find_category_id(&groups, "Groceries"));
    }

    #[tokio::test]
    async fn test_create_transaction_accepts_created() {
        let mut doer = MockDoer::new();
        doer.expect_execute()
            .times(1)
            .withf(|request| {
                let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap_or("")).unwrap();
                request.url == "https://api.ynab.com/v1/budgets/b-1/transactions"
                    && has_bearer(request)
                    && body["transaction"]["amount"] == 6010430
                    && body["transaction"]["payee_name"] == "Balance Adjustment"
            })
            .returning(|_| Ok(HttpResponse { status: 201, body: r#"{"data":{}}"#.to_string() }));

        let transaction = SaveTransaction {
            account_id: "a-1".to_string(),
            date: "2024-05-01".to_string(),
            amount: 6010430,
            payee_name: "Balance Adjustment".to_string(),
            category_id: "c-1".to_string(),
            memo: "Balance adjustment executed 2024-05-01T10:00:00Z".to_string(),
        };
        client(doer).create_transaction("b-1", transaction).await.unwrap();
    }

    #[tokio::test]
    async fn test_error_detail_is_reported() {
        let mut doer = MockDoer::new();
        doer.expect_execute()
            .returning(|_| Ok(HttpResponse { status: 401, body: r#"{"error":{"id":"401","name":"unauthorized","detail":"Unauthorized"}}"#.to_string() }));

        let err = client(doer).list_budgets().await.unwrap_err();
        assert_eq!("ledger error: unexpected status 401: unauthorized (401): Unauthorized", err.to_string());
    }

    #[test]
    fn test_unknown_names_list_sorted_alternatives() {
        let budgets = vec![
            BudgetSummary { id: "1".to_string(), name: "Zeta".to_string() },
            BudgetSummary { id: "2".to_string(), name: "Alpha".to_string() },
        ];
        let err = find_budget(&budgets, "Crypto").unwrap_err();
        assert_eq!("ledger error: budget 'Crypto' not found; available budget(s) are: ['Alpha', 'Zeta']", err.to_string());
        assert!(find_budget(&[], "Crypto").is_err());

        let accounts = vec![
            Account { id: "a".to_string(), name: "Wallet".to_string(), balance: 0, closed: false, deleted: false },
            Account { id: "b".to_string(), name: "Old".to_string(), balance: 0, closed: true, deleted: true },
            Account { id: "c".to_string(), name: "Cold".to_string(), balance: 0, closed: false, deleted: false },
        ];
        assert_eq!("c", find_account(&accounts, "Cold").unwrap().id);
        let err = find_account(&accounts, "Old").unwrap_err();
        assert_eq!("ledger error: no account found for name 'Old'; available accounts are: ['Cold', 'Wallet']", err.to_string());

        let groups = vec![CategoryGroup {
            id: "g".to_string(),
            name: "Savings".to_string(),
            categories: vec![Category { id: "c".to_string(), name: "Investments".to_string() }],
        }];
        assert_eq!(Some("c"), find_category_id(&groups, "Investments"));
    }
}
