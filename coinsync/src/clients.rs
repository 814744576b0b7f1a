pub(crate) mod coingecko;
pub(crate) mod ynab;
pub(crate) mod ynab_models;
