//! The store that owns the transaction list and orchestrates balance
//! consistency after mutations.
//!
//! The server, not the client, computes account balances, so every
//! successful create, update or delete is followed by exactly one balance
//! refresh through the injected [BalanceRefresh] seam. The refresh starts
//! strictly after the mutation resolved and after the success message was
//! recorded; a failed refresh is logged but never attributed to the
//! mutation, because a stale balance is preferable to reporting a
//! successful write as a failure.

use std::sync::{Arc, Mutex};

use time::Date;

use crate::{
    Error, api,
    api::{ApiRequest, ApiTransport, Query},
    endpoints,
    models::{
        NewTransaction, Transaction, TransactionStatus, TransactionType, UpdateTransaction,
        validate_items,
    },
    pagination::Pagination,
    stores::BalanceRefresh,
};

/// The key to sort a transaction listing by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionSortKey {
    /// Sort by transaction date.
    Date,
    /// Sort by total amount.
    Amount,
    /// Sort by title.
    Title,
}

impl TransactionSortKey {
    fn as_str(&self) -> &'static str {
        match self {
            TransactionSortKey::Date => "date",
            TransactionSortKey::Amount => "amount",
            TransactionSortKey::Title => "title",
        }
    }
}

/// The direction to sort a transaction listing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// Defines how transactions are filtered, sorted and paged by
/// [TransactionStore::get_transactions].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionQuery {
    /// Only transactions of this type.
    pub transaction_type: Option<TransactionType>,
    /// Only transactions with an item tagged with one of these categories.
    pub category_ids: Vec<String>,
    /// Only transactions with an item touching one of these accounts.
    pub account_ids: Vec<String>,
    /// Only transactions in one of these statuses.
    pub statuses: Vec<TransactionStatus>,
    /// Only transactions totalling at least this much.
    pub min_amount: Option<f64>,
    /// Only transactions totalling at most this much.
    pub max_amount: Option<f64>,
    /// Only transactions on or after this date.
    pub start_date: Option<Date>,
    /// Only transactions on or before this date.
    pub end_date: Option<Date>,
    /// Only transactions carrying one of these tags.
    pub tags: Vec<String>,
    /// Free-text search over titles and notes.
    pub search: Option<String>,
    /// Only transactions split across multiple items, or only unsplit ones.
    pub is_split: Option<bool>,
    /// Only recurring transactions, or only one-off ones.
    pub is_recurring: Option<bool>,
    /// The key to sort by.
    pub sort_by: Option<TransactionSortKey>,
    /// The direction to sort in.
    pub sort_order: Option<SortOrder>,
    /// The page to fetch on an initial load; defaults to the first.
    pub page: Option<u64>,
    /// Records per page.
    pub limit: Option<u64>,
}

impl TransactionQuery {
    /// Serialize the filters for the given page, overriding the query's own
    /// page/limit when the caller pages incrementally.
    fn to_query(&self, page: Option<u64>, limit: Option<u64>) -> Query {
        let mut query = Query::new();
        query.push_opt("type", self.transaction_type);
        query.push_list("categoryIds", &self.category_ids);
        query.push_list("accountIds", &self.account_ids);
        query.push_list(
            "statuses",
            &self
                .statuses
                .iter()
                .map(|status| status.as_str())
                .collect::<Vec<_>>(),
        );
        query.push_opt("minAmount", self.min_amount);
        query.push_opt("maxAmount", self.max_amount);
        query.push_date("startDate", self.start_date);
        query.push_date("endDate", self.end_date);
        query.push_list("tags", &self.tags);
        query.push_opt("search", self.search.clone());
        query.push_opt("isSplit", self.is_split);
        query.push_opt("isRecurring", self.is_recurring);
        query.push_opt("sortBy", self.sort_by.map(|key| key.as_str()));
        query.push_opt("sortOrder", self.sort_order.map(|order| order.as_str()));
        query.push_opt("page", page.or(self.page));
        query.push_opt("limit", limit.or(self.limit));
        query
    }
}

/// The state slice owned by the transaction store.
#[derive(Debug, Default)]
struct TransactionState {
    transactions: Vec<Transaction>,
    pending: Vec<Transaction>,
    selected: Option<Transaction>,
    pagination: Pagination,
    is_loading: bool,
    is_loading_more: bool,
    error: Option<String>,
    success_message: Option<String>,
}

/// Caches the transaction list and keeps account balances consistent by
/// triggering a refresh after every money-moving mutation.
pub struct TransactionStore<T, R> {
    api: Arc<T>,
    balances: Arc<R>,
    state: Mutex<TransactionState>,
}

impl<T, R> TransactionStore<T, R>
where
    T: ApiTransport + Send + Sync,
    R: BalanceRefresh + Send + Sync,
{
    /// Create a transaction store that talks through `api` and notifies
    /// `balances` after each successful mutation.
    pub fn new(api: Arc<T>, balances: Arc<R>) -> Self {
        Self {
            api,
            balances,
            state: Mutex::new(TransactionState::default()),
        }
    }

    /// Fetch a filtered page and replace both the list and the pagination
    /// metadata. Read contract: failures are recorded, not propagated.
    pub async fn get_transactions(&self, query: &TransactionQuery) {
        self.begin(true);

        let request = ApiRequest::get(
            endpoints::TRANSACTIONS,
            query.to_query(None, None).into_params(),
        );
        let result = api::execute(self.api.as_ref(), request)
            .await
            .and_then(|response| api::decode_page::<Transaction>(response.data));

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(page) => {
                state.transactions = page.data;
                // A fresh fetch replaces pagination wholesale; merging is
                // only for incremental loads.
                state.pagination = page.meta;
            }
            Err(error) => state.error = Some(error.to_string()),
        }
    }

    /// Fetch the next page and append it, deduplicated by ID. A no-op
    /// without a network call once the last page is loaded. Read contract.
    pub async fn load_more_transactions(&self, query: &TransactionQuery) {
        let (next_page, limit) = {
            let mut state = self.state.lock().unwrap();
            if !state.pagination.has_more() || state.is_loading_more {
                return;
            }
            state.is_loading_more = true;
            state.error = None;
            (state.pagination.page + 1, state.pagination.limit)
        };

        let request = ApiRequest::get(
            endpoints::TRANSACTIONS,
            query.to_query(Some(next_page), Some(limit)).into_params(),
        );
        let result = api::execute(self.api.as_ref(), request)
            .await
            .and_then(|response| api::decode_page::<Transaction>(response.data));

        let mut state = self.state.lock().unwrap();
        state.is_loading_more = false;
        match result {
            Ok(page) => {
                for transaction in page.data {
                    if !state
                        .transactions
                        .iter()
                        .any(|existing| existing.id == transaction.id)
                    {
                        state.transactions.push(transaction);
                    }
                }
                state.pagination = page.meta;
            }
            Err(error) => state.error = Some(error.to_string()),
        }
    }

    /// Fetch a single transaction for a detail view. Read contract.
    pub async fn get_transaction(&self, transaction_id: &str) {
        self.begin(true);

        let result = api::execute(
            self.api.as_ref(),
            ApiRequest::get(endpoints::transaction(transaction_id), Vec::new()),
        )
        .await
        .and_then(|response| api::decode_data::<Transaction>(response.data));

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(transaction) => state.selected = Some(transaction),
            Err(error) => state.error = Some(error.to_string()),
        }
    }

    /// Fetch the transactions awaiting clearance. Read contract.
    pub async fn get_pending_transactions(&self) {
        self.begin(true);

        let result = api::execute(
            self.api.as_ref(),
            ApiRequest::get(endpoints::PENDING_TRANSACTIONS, Vec::new()),
        )
        .await
        .and_then(|response| api::decode_data::<Vec<Transaction>>(response.data));

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(pending) => state.pending = pending,
            Err(error) => state.error = Some(error.to_string()),
        }
    }

    /// Fetch the transactions within a date range, replacing the list and
    /// pagination like [TransactionStore::get_transactions]. Read contract.
    pub async fn get_transactions_by_date_range(&self, start_date: Date, end_date: Date) {
        self.begin(true);

        let mut query = Query::new();
        query.push_date("startDate", Some(start_date));
        query.push_date("endDate", Some(end_date));

        let request = ApiRequest::get(endpoints::TRANSACTIONS_BY_DATE_RANGE, query.into_params());
        let result = api::execute(self.api.as_ref(), request)
            .await
            .and_then(|response| api::decode_page::<Transaction>(response.data));

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(page) => {
                state.transactions = page.data;
                state.pagination = page.meta;
            }
            Err(error) => state.error = Some(error.to_string()),
        }
    }

    /// Create a transaction atomically with its items, then refresh account
    /// balances. Mutation contract.
    pub async fn create_transaction(
        &self,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, Error> {
        if new_transaction.title.trim().is_empty() {
            return Err(self.record_error(Error::Validation(
                "Transaction title cannot be empty.".to_owned(),
            )));
        }
        if let Err(error) = validate_items(&new_transaction.items) {
            return Err(self.record_error(error));
        }

        let body = serde_json::to_value(&new_transaction)?;
        self.begin(true);

        let result = api::execute(
            self.api.as_ref(),
            ApiRequest::post(endpoints::TRANSACTIONS, body),
        )
        .await
        .and_then(|response| {
            let transaction = api::decode_data::<Transaction>(response.data)?;
            Ok((transaction, response.message))
        });

        let transaction = {
            let mut state = self.state.lock().unwrap();
            state.is_loading = false;
            match result {
                Ok((transaction, message)) => {
                    state.transactions.insert(0, transaction.clone());
                    state.success_message =
                        Some(message.unwrap_or_else(|| "Transaction created.".to_owned()));
                    transaction
                }
                Err(error) => {
                    state.error = Some(error.to_string());
                    return Err(error);
                }
            }
        };

        self.refresh_balances_after_mutation("create").await;

        Ok(transaction)
    }

    /// Update a transaction (the item set, when present, replaces the
    /// existing items), then refresh account balances. Mutation contract.
    pub async fn update_transaction(
        &self,
        transaction_id: &str,
        update: UpdateTransaction,
    ) -> Result<Transaction, Error> {
        if update
            .title
            .as_deref()
            .is_some_and(|title| title.trim().is_empty())
        {
            return Err(self.record_error(Error::Validation(
                "Transaction title cannot be empty.".to_owned(),
            )));
        }
        if let Some(items) = &update.items
            && let Err(error) = validate_items(items)
        {
            return Err(self.record_error(error));
        }

        let body = serde_json::to_value(&update)?;
        self.begin(true);

        let result = api::execute(
            self.api.as_ref(),
            ApiRequest::put(endpoints::transaction(transaction_id), body),
        )
        .await
        .and_then(|response| {
            let transaction = api::decode_data::<Transaction>(response.data)?;
            Ok((transaction, response.message))
        });

        let transaction = {
            let mut state = self.state.lock().unwrap();
            state.is_loading = false;
            match result {
                Ok((transaction, message)) => {
                    if let Some(existing) = state
                        .transactions
                        .iter_mut()
                        .find(|existing| existing.id == transaction.id)
                    {
                        *existing = transaction.clone();
                    }
                    if state
                        .selected
                        .as_ref()
                        .is_some_and(|selected| selected.id == transaction.id)
                    {
                        state.selected = Some(transaction.clone());
                    }
                    state.success_message =
                        Some(message.unwrap_or_else(|| "Transaction updated.".to_owned()));
                    transaction
                }
                Err(error) => {
                    state.error = Some(error.to_string());
                    return Err(error);
                }
            }
        };

        self.refresh_balances_after_mutation("update").await;

        Ok(transaction)
    }

    /// Delete a transaction and all its items, then refresh account
    /// balances. Mutation contract.
    pub async fn delete_transaction(&self, transaction_id: &str) -> Result<(), Error> {
        self.begin(true);

        let result = api::execute(
            self.api.as_ref(),
            ApiRequest::delete(endpoints::transaction(transaction_id)),
        )
        .await;

        {
            let mut state = self.state.lock().unwrap();
            state.is_loading = false;
            match result {
                Ok(response) => {
                    state
                        .transactions
                        .retain(|transaction| transaction.id != transaction_id);
                    state.pending.retain(|transaction| transaction.id != transaction_id);
                    if state
                        .selected
                        .as_ref()
                        .is_some_and(|selected| selected.id == transaction_id)
                    {
                        state.selected = None;
                    }
                    state.success_message = Some(
                        response
                            .message
                            .unwrap_or_else(|| "Transaction deleted.".to_owned()),
                    );
                }
                Err(error) => {
                    state.error = Some(error.to_string());
                    return Err(error);
                }
            }
        }

        self.refresh_balances_after_mutation("delete").await;

        Ok(())
    }

    /// A snapshot of the cached transaction list.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().transactions.clone()
    }

    /// A snapshot of the pending transactions.
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().pending.clone()
    }

    /// A snapshot of the most recently fetched single transaction.
    pub fn selected_transaction(&self) -> Option<Transaction> {
        self.state.lock().unwrap().selected.clone()
    }

    /// A snapshot of the pagination metadata.
    pub fn pagination(&self) -> Pagination {
        self.state.lock().unwrap().pagination
    }

    /// Whether a further page can be requested.
    pub fn has_more(&self) -> bool {
        self.state.lock().unwrap().pagination.has_more()
    }

    /// Whether an initial fetch or mutation is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.lock().unwrap().is_loading
    }

    /// Whether an incremental page load is in flight.
    pub fn is_loading_more(&self) -> bool {
        self.state.lock().unwrap().is_loading_more
    }

    /// The normalized message of the most recent failure.
    pub fn error(&self) -> Option<String> {
        self.state.lock().unwrap().error.clone()
    }

    /// The server's message for the most recent successful mutation.
    pub fn success_message(&self) -> Option<String> {
        self.state.lock().unwrap().success_message.clone()
    }

    /// Trigger the balance refresh that must follow every money-moving
    /// mutation. The implementer records its own failures; nothing is
    /// attributed to the mutation that already succeeded.
    async fn refresh_balances_after_mutation(&self, operation: &str) {
        tracing::debug!("refreshing account balances after transaction {operation}");
        self.balances.refresh_balances().await;
    }

    fn begin(&self, loading: bool) {
        let mut state = self.state.lock().unwrap();
        state.is_loading = loading;
        state.error = None;
        state.success_message = None;
    }

    fn record_error(&self, error: Error) -> Error {
        self.state.lock().unwrap().error = Some(error.to_string());
        error
    }
}

#[cfg(test)]
mod transaction_query_tests {
    use time::macros::date;

    use crate::models::{TransactionStatus, TransactionType};

    use super::{SortOrder, TransactionQuery, TransactionSortKey};

    #[test]
    fn serializes_the_full_filter_set() {
        let query = TransactionQuery {
            transaction_type: Some(TransactionType::Expense),
            category_ids: vec!["c-1".to_owned(), "c-2".to_owned()],
            account_ids: vec!["a-1".to_owned()],
            statuses: vec![TransactionStatus::Pending, TransactionStatus::Cleared],
            min_amount: Some(10.0),
            max_amount: Some(99.5),
            start_date: Some(date!(2025 - 01 - 01)),
            end_date: Some(date!(2025 - 01 - 31)),
            tags: vec!["holiday".to_owned()],
            search: Some("coffee".to_owned()),
            is_split: Some(false),
            is_recurring: Some(true),
            sort_by: Some(TransactionSortKey::Amount),
            sort_order: Some(SortOrder::Descending),
            page: Some(2),
            limit: Some(25),
        };

        let want = vec![
            ("type".to_owned(), "expense".to_owned()),
            ("categoryIds".to_owned(), "c-1,c-2".to_owned()),
            ("accountIds".to_owned(), "a-1".to_owned()),
            ("statuses".to_owned(), "pending,cleared".to_owned()),
            ("minAmount".to_owned(), "10".to_owned()),
            ("maxAmount".to_owned(), "99.5".to_owned()),
            ("startDate".to_owned(), "2025-01-01".to_owned()),
            ("endDate".to_owned(), "2025-01-31".to_owned()),
            ("tags".to_owned(), "holiday".to_owned()),
            ("search".to_owned(), "coffee".to_owned()),
            ("isSplit".to_owned(), "false".to_owned()),
            ("isRecurring".to_owned(), "true".to_owned()),
            ("sortBy".to_owned(), "amount".to_owned()),
            ("sortOrder".to_owned(), "desc".to_owned()),
            ("page".to_owned(), "2".to_owned()),
            ("limit".to_owned(), "25".to_owned()),
        ];

        assert_eq!(want, query.to_query(None, None).into_params());
    }

    #[test]
    fn default_query_serializes_to_nothing() {
        assert!(
            TransactionQuery::default()
                .to_query(None, None)
                .into_params()
                .is_empty()
        );
    }
}
