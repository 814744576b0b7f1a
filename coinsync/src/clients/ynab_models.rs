use serde::{Deserialize, Serialize};

/// Every YNAB response wraps its payload in `data`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct BudgetsData {
    pub budgets: Vec<BudgetSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BudgetSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AccountsData {
    pub accounts: Vec<Account>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[allow(unused)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub balance: i64, // milliunits
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesData {
    pub category_groups: Vec<CategoryGroup>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[allow(unused)]
pub struct CategoryGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SaveTransaction {
    pub account_id: String,
    pub date: String, // YYYY-MM-DD
    pub amount: i64,  // milliunits
    pub payee_name: String,
    pub category_id: String,
    pub memo: String,
}

#[derive(Debug, Serialize)]
pub struct SaveTransactionWrapper {
    pub transaction: SaveTransaction,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub detail: String,
}
