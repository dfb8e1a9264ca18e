//! Client-side state stores for a personal-finance REST API.
//!
//! Each store owns one slice of application state (accounts, categories,
//! budgets, transactions) behind a [std::sync::Mutex], talks to the server
//! through the [ApiTransport] seam, and normalizes every failure into the
//! user-facing messages of [Error]. Reads record their failures in store
//! state; mutations additionally return them, so callers can sequence
//! follow-up work without polling the store.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use pocketledger::{AccountStore, ApiTransport, TransactionStore};
//! # async fn example<T: ApiTransport + Send + Sync>(transport: Arc<T>) {
//! let accounts = Arc::new(AccountStore::new(Arc::clone(&transport)));
//! let transactions = TransactionStore::new(transport, Arc::clone(&accounts));
//!
//! accounts.get_accounts().await;
//! println!("{} accounts loaded", accounts.accounts().len());
//! # }
//! ```
#![warn(missing_docs)]

mod api;
mod endpoints;
mod error;
mod models;
mod pagination;
mod stores;

#[cfg(test)]
mod test_utils;

pub use api::{ApiRequest, ApiTransport, Method, Query, RawResponse, TransportError};
pub use error::Error;
pub use models::{
    Account, AccountDetails, AccountId, Budget, BudgetCategory, BudgetCategoryAllocation,
    BudgetId, BudgetStats, Category, CategoryBudgetStats, CategoryId, NewAccount, NewBudget,
    NewCategory, NewTransaction, OverallBudgetStats, SubcategorySummary, Transaction,
    TransactionId, TransactionItem, TransactionStatus, TransactionType, UpdateAccount,
    UpdateBudget, UpdateCategory, UpdateTransaction,
};
pub use pagination::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, Pagination};
pub use stores::{
    AccountStore, BalanceRefresh, BudgetQuery, BudgetStore, CategoryQuery, CategoryStore,
    SortOrder, TransactionQuery, TransactionSortKey, TransactionStore,
};
