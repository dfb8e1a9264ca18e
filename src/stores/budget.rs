//! The store that owns budgets and their server-computed statistics.
//!
//! List responses embed a `stats` object in every budget record. The store
//! splits each page into two collections: `budgets` (stats stripped, so
//! nested data can never go stale) and `budget_details`, a map from budget
//! ID to statistics that can be refreshed on its own. Percentages are kept
//! exactly as they arrive; values above 100 signal overage and clamping is
//! left to presentation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{
    Error, api,
    api::{ApiRequest, ApiTransport, Query},
    endpoints,
    models::{
        Budget, BudgetId, BudgetStats, BudgetWithStats, NewBudget, OverallBudgetStats,
        UpdateBudget, validate_budget,
    },
    pagination::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, Pagination},
};

/// Filters for listing budgets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetQuery {
    /// Only budgets covering the current period.
    pub active_only: Option<bool>,
    /// Free-text search over budget names.
    pub search: Option<String>,
    /// The page to fetch on an initial load; defaults to the first.
    pub page: Option<u64>,
    /// Records per page; the store default applies when absent.
    pub limit: Option<u64>,
}

impl BudgetQuery {
    fn to_query(&self, page: u64, limit: u64) -> Query {
        let mut query = Query::new();
        query.push_opt("activeOnly", self.active_only);
        query.push_opt("search", self.search.clone());
        query.push("page", page);
        query.push("limit", limit);
        query
    }
}

/// The state slice owned by the budget store.
#[derive(Debug, Default)]
struct BudgetState {
    budgets: Vec<Budget>,
    budget_details: HashMap<BudgetId, BudgetStats>,
    overall_stats: Option<OverallBudgetStats>,
    pagination: Pagination,
    is_loading: bool,
    is_loading_more: bool,
    error: Option<String>,
    success_message: Option<String>,
}

/// Caches the paginated budget list, the per-budget statistics map and the
/// account-wide summary.
pub struct BudgetStore<T> {
    api: Arc<T>,
    state: Mutex<BudgetState>,
}

impl<T: ApiTransport + Send + Sync> BudgetStore<T> {
    /// Create a budget store that talks through `api`.
    pub fn new(api: Arc<T>) -> Self {
        Self {
            api,
            state: Mutex::new(BudgetState::default()),
        }
    }

    /// Fetch the budget list and the account-wide summary concurrently and
    /// apply both, or neither.
    ///
    /// The two requests are joined before any state changes; if either
    /// fails, the whole operation fails and existing state is untouched, so
    /// the UI never sees budgets without overall stats or vice versa. A
    /// well-formed envelope whose list payload is malformed degrades to an
    /// empty list with pagination reset to the zero state. Read contract:
    /// failures are recorded, not propagated.
    pub async fn get_budgets(&self, query: &BudgetQuery) {
        {
            let mut state = self.state.lock().unwrap();
            state.is_loading = true;
            state.error = None;
            state.success_message = None;
        }

        let page = query.page.unwrap_or(DEFAULT_PAGE);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let list_request =
            ApiRequest::get(endpoints::BUDGETS, query.to_query(page, limit).into_params());
        let stats_request = ApiRequest::get(endpoints::OVERALL_BUDGET_STATS, Vec::new());

        let (list_result, stats_result) = tokio::join!(
            api::execute(self.api.as_ref(), list_request),
            api::execute(self.api.as_ref(), stats_request),
        );

        let outcome = list_result.and_then(|list_response| {
            let stats_response = stats_result?;
            let overall = api::decode_data::<OverallBudgetStats>(stats_response.data)?;
            let page = api::decode_page_or_empty::<BudgetWithStats>(list_response.data, "budget");
            Ok((page, overall))
        });

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match outcome {
            Ok((page, overall)) => {
                let (budgets, details) = split_stats(page.data);
                state.budgets = budgets;
                state.budget_details = details;
                state.overall_stats = Some(overall);
                state.pagination = page.meta;
            }
            // Partial success is not exposed: one error message, no state
            // change beyond the flags.
            Err(error) => state.error = Some(error.to_string()),
        }
    }

    /// Fetch the next page and merge it into the cached collections.
    ///
    /// A strict no-op without a network call once
    /// `pagination.page >= pagination.totalPages`. New budgets are appended
    /// (deduplicated by ID), and the new page's statistics are merged
    /// key-wise into `budget_details`. Read contract.
    pub async fn load_more_budgets(&self, query: &BudgetQuery) {
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
            endpoints::BUDGETS,
            query.to_query(next_page, limit).into_params(),
        );
        let result = api::execute(self.api.as_ref(), request).await;

        let mut state = self.state.lock().unwrap();
        state.is_loading_more = false;
        match result {
            Ok(response) => {
                let page = api::decode_page_or_empty::<BudgetWithStats>(response.data, "budget");
                let (budgets, details) = split_stats(page.data);

                for budget in budgets {
                    if !state.budgets.iter().any(|existing| existing.id == budget.id) {
                        state.budgets.push(budget);
                    }
                }
                state.budget_details.extend(details);
                state.pagination = page.meta;
            }
            Err(error) => state.error = Some(error.to_string()),
        }
    }

    /// Refresh the statistics of a single budget without touching the
    /// budget record itself. Read contract.
    pub async fn get_budget_stats(&self, budget_id: &str) {
        let result = api::execute(
            self.api.as_ref(),
            ApiRequest::get(endpoints::budget_stats(budget_id), Vec::new()),
        )
        .await
        .and_then(|response| api::decode_data::<BudgetStats>(response.data));

        let mut state = self.state.lock().unwrap();
        match result {
            Ok(stats) => {
                state.budget_details.insert(budget_id.to_owned(), stats);
            }
            Err(error) => state.error = Some(error.to_string()),
        }
    }

    /// Create a budget, splitting its embedded statistics exactly like the
    /// list path. Mutation contract.
    pub async fn create_budget(&self, new_budget: NewBudget) -> Result<Budget, Error> {
        if let Err(error) = validate_budget(
            new_budget.amount,
            new_budget.start_date,
            new_budget.end_date,
            &new_budget.categories,
        ) {
            self.state.lock().unwrap().error = Some(error.to_string());
            return Err(error);
        }

        let body = serde_json::to_value(&new_budget)?;
        self.begin_mutation();

        let result = api::execute(self.api.as_ref(), ApiRequest::post(endpoints::BUDGETS, body))
            .await
            .and_then(|response| {
                let budget = api::decode_data::<BudgetWithStats>(response.data)?;
                Ok((budget, response.message))
            });

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok((with_stats, message)) => {
                let BudgetWithStats { budget, stats } = with_stats;
                if let Some(stats) = stats {
                    state.budget_details.insert(budget.id.clone(), stats);
                }
                state.budgets.push(budget.clone());
                state.success_message =
                    Some(message.unwrap_or_else(|| "Budget created.".to_owned()));
                Ok(budget)
            }
            Err(error) => {
                state.error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// Update a budget in place, refreshing its statistics entry from the
    /// response. Mutation contract.
    pub async fn update_budget(
        &self,
        budget_id: &str,
        update: UpdateBudget,
    ) -> Result<Budget, Error> {
        // Validate the update against the cached record so a partial update
        // cannot invert the date range.
        let (current_amount, current_start, current_end) = {
            let state = self.state.lock().unwrap();
            match state.budgets.iter().find(|budget| budget.id == budget_id) {
                Some(budget) => (budget.amount, budget.start_date, budget.end_date),
                None => (1.0, time::Date::MIN, None),
            }
        };

        if let Err(error) = validate_budget(
            update.amount.unwrap_or(current_amount),
            update.start_date.unwrap_or(current_start),
            update.end_date.or(current_end),
            update.categories.as_deref().unwrap_or(&[]),
        ) {
            self.state.lock().unwrap().error = Some(error.to_string());
            return Err(error);
        }

        let body = serde_json::to_value(&update)?;
        self.begin_mutation();

        let result = api::execute(
            self.api.as_ref(),
            ApiRequest::put(endpoints::budget(budget_id), body),
        )
        .await
        .and_then(|response| {
            let budget = api::decode_data::<BudgetWithStats>(response.data)?;
            Ok((budget, response.message))
        });

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok((with_stats, message)) => {
                let BudgetWithStats { budget, stats } = with_stats;
                if let Some(stats) = stats {
                    state.budget_details.insert(budget.id.clone(), stats);
                }
                if let Some(existing) = state
                    .budgets
                    .iter_mut()
                    .find(|existing| existing.id == budget.id)
                {
                    *existing = budget.clone();
                }
                state.success_message =
                    Some(message.unwrap_or_else(|| "Budget updated.".to_owned()));
                Ok(budget)
            }
            Err(error) => {
                state.error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// Delete a budget, evicting both the record and its statistics entry.
    /// Mutation contract.
    pub async fn delete_budget(&self, budget_id: &str) -> Result<(), Error> {
        self.begin_mutation();

        let result = api::execute(
            self.api.as_ref(),
            ApiRequest::delete(endpoints::budget(budget_id)),
        )
        .await;

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(response) => {
                state.budgets.retain(|budget| budget.id != budget_id);
                state.budget_details.remove(budget_id);
                state.success_message = Some(
                    response
                        .message
                        .unwrap_or_else(|| "Budget deleted.".to_owned()),
                );
                Ok(())
            }
            Err(error) => {
                state.error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// A snapshot of the cached budget list (statistics stripped).
    pub fn budgets(&self) -> Vec<Budget> {
        self.state.lock().unwrap().budgets.clone()
    }

    /// A snapshot of the per-budget statistics map.
    pub fn budget_details(&self) -> HashMap<BudgetId, BudgetStats> {
        self.state.lock().unwrap().budget_details.clone()
    }

    /// A snapshot of the account-wide summary.
    pub fn overall_stats(&self) -> Option<OverallBudgetStats> {
        self.state.lock().unwrap().overall_stats.clone()
    }

    /// A snapshot of the pagination metadata.
    pub fn pagination(&self) -> Pagination {
        self.state.lock().unwrap().pagination
    }

    /// Whether a further page can be requested. Recomputed from the stored
    /// pagination after every page load.
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

    fn begin_mutation(&self) {
        let mut state = self.state.lock().unwrap();
        state.is_loading = true;
        state.error = None;
        state.success_message = None;
    }
}

/// Split a page of budget records into the stats-stripped list and the
/// statistics map.
fn split_stats(records: Vec<BudgetWithStats>) -> (Vec<Budget>, HashMap<BudgetId, BudgetStats>) {
    let mut budgets = Vec::with_capacity(records.len());
    let mut details = HashMap::with_capacity(records.len());

    for record in records {
        if let Some(stats) = record.stats {
            details.insert(record.budget.id.clone(), stats);
        }
        budgets.push(record.budget);
    }

    (budgets, details)
}

#[cfg(test)]
mod budget_store_tests {
    use std::sync::Arc;

    use serde_json::{Value, json};

    use crate::test_utils::{FakeTransport, envelope_ok, envelope_page};

    use super::{BudgetQuery, BudgetStore};

    fn budget_json(id: &str, name: &str, spent: f64) -> Value {
        json!({
            "id": id,
            "name": name,
            "amount": 200.0,
            "startDate": "2025-05-01",
            "endDate": "2025-05-31",
            "rolloverEnabled": false,
            "categories": [
                { "categoryId": "c-1", "allocatedAmount": 200.0, "rolloverAmount": 0.0 },
            ],
            "stats": {
                "totalAllocated": 200.0,
                "totalSpent": spent,
                "totalRemaining": 200.0 - spent,
                "overallPercentageUsed": spent / 200.0 * 100.0,
                "categories": [],
            },
        })
    }

    fn overall_json() -> Value {
        envelope_ok(
            None,
            json!({
                "totalBudgeted": 600.0,
                "totalSpent": 250.0,
                "totalRemaining": 350.0,
                "overallPercentageUsed": 41.7,
                "activeBudgetCount": 3,
            }),
        )
    }

    #[tokio::test]
    async fn get_budgets_splits_stats_from_records() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_ok(envelope_page(json!([budget_json("b-1", "Food", 250.0)]), 1, 1, 20, 1));
        transport.push_ok(overall_json());
        let store = BudgetStore::new(transport);

        store.get_budgets(&BudgetQuery::default()).await;

        let budgets = store.budgets();
        assert_eq!(1, budgets.len());
        assert_eq!("b-1", budgets[0].id);

        let details = store.budget_details();
        // Uncapped: 250 spent of 200 allocated is 125%.
        assert_eq!(125.0, details["b-1"].overall_percentage_used);
        assert_eq!(100.0, details["b-1"].display_percentage());
        assert!(store.overall_stats().is_some());
    }

    #[tokio::test]
    async fn get_budgets_fails_as_a_whole_when_either_request_fails() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_ok(envelope_page(json!([budget_json("b-1", "Food", 10.0)]), 1, 1, 20, 1));
        transport.push_status(500);
        let store = BudgetStore::new(transport);

        store.get_budgets(&BudgetQuery::default()).await;

        assert!(store.budgets().is_empty());
        assert!(store.overall_stats().is_none());
        assert_eq!(
            Some("An internal server error occurred. Please try again later.".to_owned()),
            store.error()
        );
    }

    #[tokio::test]
    async fn malformed_list_payload_degrades_to_empty_list_with_zero_pagination() {
        crate::test_utils::init_tracing();

        let transport = Arc::new(FakeTransport::new());
        transport.push_ok(envelope_ok(None, json!({ "data": "not an array" })));
        transport.push_ok(overall_json());
        let store = BudgetStore::new(transport);

        store.get_budgets(&BudgetQuery::default()).await;

        assert!(store.budgets().is_empty());
        assert_eq!(0, store.pagination().page);
        assert_eq!(0, store.pagination().total_pages);
        // The overall stats that succeeded are still applied.
        assert!(store.overall_stats().is_some());
        assert_eq!(None, store.error());
    }

    #[tokio::test]
    async fn load_more_appends_budgets_and_merges_details() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_ok(envelope_page(json!([budget_json("b-1", "Food", 50.0)]), 2, 1, 1, 2));
        transport.push_ok(overall_json());
        transport.push_ok(envelope_page(json!([budget_json("b-2", "Rent", 80.0)]), 2, 2, 1, 2));
        let store = BudgetStore::new(Arc::clone(&transport));

        store.get_budgets(&BudgetQuery::default()).await;
        assert!(store.has_more());

        store.load_more_budgets(&BudgetQuery::default()).await;

        let ids: Vec<String> = store.budgets().iter().map(|b| b.id.clone()).collect();
        assert_eq!(vec!["b-1".to_owned(), "b-2".to_owned()], ids);

        let details = store.budget_details();
        assert_eq!(2, details.len());
        assert!(details.contains_key("b-1"));
        assert!(details.contains_key("b-2"));
        assert!(!store.has_more());

        let page_request = &transport.requests()[2];
        assert!(page_request.query.contains(&("page".to_owned(), "2".to_owned())));
        assert!(page_request.query.contains(&("limit".to_owned(), "1".to_owned())));
    }

    #[tokio::test]
    async fn load_more_on_last_page_changes_nothing_and_sends_nothing() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_ok(envelope_page(json!([budget_json("b-1", "Food", 50.0)]), 1, 1, 20, 1));
        transport.push_ok(overall_json());
        let store = BudgetStore::new(Arc::clone(&transport));

        store.get_budgets(&BudgetQuery::default()).await;
        let budgets_before = store.budgets();
        let details_before = store.budget_details();
        let pagination_before = store.pagination();
        let requests_before = transport.request_count();

        store.load_more_budgets(&BudgetQuery::default()).await;

        assert_eq!(budgets_before, store.budgets());
        assert_eq!(details_before, store.budget_details());
        assert_eq!(pagination_before, store.pagination());
        assert_eq!(requests_before, transport.request_count());
    }

    #[tokio::test]
    async fn load_more_dedups_overlapping_pages_by_id() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_ok(envelope_page(json!([budget_json("b-1", "Food", 50.0)]), 2, 1, 1, 2));
        transport.push_ok(overall_json());
        transport.push_ok(envelope_page(
            json!([budget_json("b-1", "Food", 50.0), budget_json("b-2", "Rent", 80.0)]),
            2,
            2,
            1,
            2,
        ));
        let store = BudgetStore::new(transport);

        store.get_budgets(&BudgetQuery::default()).await;
        store.load_more_budgets(&BudgetQuery::default()).await;

        let ids: Vec<String> = store.budgets().iter().map(|b| b.id.clone()).collect();
        assert_eq!(vec!["b-1".to_owned(), "b-2".to_owned()], ids);
    }

    #[tokio::test]
    async fn targeted_stats_refresh_updates_only_the_details_entry() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_ok(envelope_page(json!([budget_json("b-1", "Food", 50.0)]), 1, 1, 20, 1));
        transport.push_ok(overall_json());
        transport.push_ok(envelope_ok(
            None,
            json!({
                "totalAllocated": 200.0,
                "totalSpent": 150.0,
                "totalRemaining": 50.0,
                "overallPercentageUsed": 75.0,
                "categories": [],
            }),
        ));
        let store = BudgetStore::new(transport);

        store.get_budgets(&BudgetQuery::default()).await;
        let budget_before = store.budgets()[0].clone();

        store.get_budget_stats("b-1").await;

        assert_eq!(75.0, store.budget_details()["b-1"].overall_percentage_used);
        assert_eq!(budget_before, store.budgets()[0]);
    }
}
