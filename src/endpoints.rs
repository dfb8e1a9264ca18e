//! The API endpoint URIs.
//!
//! Endpoints that take a parameter are exposed as functions so call sites
//! cannot forget to fill the placeholder.

/// The route to list and create accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to list and create budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route for the account-wide budget statistics summary.
pub const OVERALL_BUDGET_STATS: &str = "/api/budgets/stats/overall";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route for transactions awaiting clearance.
pub const PENDING_TRANSACTIONS: &str = "/api/transactions/pending";
/// The route for transactions within a date range.
pub const TRANSACTIONS_BY_DATE_RANGE: &str = "/api/transactions/date-range";

/// The route for a single account, also used for update and delete.
pub fn account(account_id: &str) -> String {
    format!("{ACCOUNTS}/{account_id}")
}

/// The route for a single category, also used for update and delete.
pub fn category(category_id: &str) -> String {
    format!("{CATEGORIES}/{category_id}")
}

/// The route for a single budget, also used for update and delete.
pub fn budget(budget_id: &str) -> String {
    format!("{BUDGETS}/{budget_id}")
}

/// The route for the statistics of a single budget.
pub fn budget_stats(budget_id: &str) -> String {
    format!("{BUDGETS}/{budget_id}/stats")
}

/// The route for a single transaction, also used for update and delete.
pub fn transaction(transaction_id: &str) -> String {
    format!("{TRANSACTIONS}/{transaction_id}")
}
