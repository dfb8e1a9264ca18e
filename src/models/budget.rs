//! Budgets, their per-category allocations, and derived statistics.
//!
//! Statistics are computed server-side and only cached client-side. The
//! list endpoint embeds a `stats` object in every budget record; the store
//! splits that off into an independently refreshable cache, so budget
//! records and statistics never duplicate each other in state.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, models::CategoryId};

/// The server-issued identifier of a budget.
pub type BudgetId = String;

/// A spending plan allocating amounts to categories over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The display name of the budget.
    pub name: String,
    /// The overall amount allocated across all categories.
    pub amount: f64,
    /// The first day the budget covers.
    pub start_date: Date,
    /// The last day the budget covers; open-ended when absent. Always after
    /// `start_date` when present.
    #[serde(default)]
    pub end_date: Option<Date>,
    /// Whether unspent allocation carries over into the next period.
    pub rollover_enabled: bool,
    /// The per-category allocations.
    #[serde(default)]
    pub categories: Vec<BudgetCategory>,
}

/// The portion of a budget's amount assigned to one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategory {
    /// The category the allocation is for.
    pub category_id: CategoryId,
    /// The amount allocated to the category this period.
    pub allocated_amount: f64,
    /// Unspent allocation carried in from the previous period.
    #[serde(default)]
    pub rollover_amount: f64,
}

/// Server-computed statistics for one budget.
///
/// `overall_percentage_used` is stored exactly as it arrives and may exceed
/// 100 to signal overage; clamping to a visual cap is a presentation
/// concern. Use [BudgetStats::display_percentage] for bar widths so both
/// numbers derive from the same stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStats {
    /// The sum of all category allocations.
    pub total_allocated: f64,
    /// The sum of spending against the budget's categories.
    pub total_spent: f64,
    /// `total_allocated - total_spent`.
    pub total_remaining: f64,
    /// `total_spent / total_allocated * 100`, uncapped.
    pub overall_percentage_used: f64,
    /// Per-category breakdowns.
    #[serde(default)]
    pub categories: Vec<CategoryBudgetStats>,
}

impl BudgetStats {
    /// The percentage clamped to 100 for rendering bar widths.
    pub fn display_percentage(&self) -> f64 {
        self.overall_percentage_used.min(100.0)
    }
}

/// Server-computed statistics for one category within a budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBudgetStats {
    /// The category these statistics are for.
    pub category_id: CategoryId,
    /// The amount allocated to the category, rollover included.
    pub allocated: f64,
    /// The amount spent against the category.
    pub spent: f64,
    /// `allocated - spent`.
    pub remaining: f64,
    /// `spent / allocated * 100`, uncapped.
    pub percentage_used: f64,
    /// Whether spending exceeds the allocation.
    pub is_over_budget: bool,
}

/// Account-wide budget statistics across all active budgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallBudgetStats {
    /// The sum of allocations across all active budgets.
    pub total_budgeted: f64,
    /// The sum of spending across all active budgets.
    pub total_spent: f64,
    /// `total_budgeted - total_spent`.
    pub total_remaining: f64,
    /// `total_spent / total_budgeted * 100`, uncapped.
    pub overall_percentage_used: f64,
    /// The number of budgets covering the current period.
    #[serde(default)]
    pub active_budget_count: u64,
}

/// The wire shape of a budget in list and mutation responses: the budget
/// record with its statistics embedded.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BudgetWithStats {
    #[serde(flatten)]
    pub budget: Budget,
    #[serde(default)]
    pub stats: Option<BudgetStats>,
}

/// An allocation entry in a create/update payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategoryAllocation {
    /// The category to allocate to.
    pub category_id: CategoryId,
    /// The amount to allocate. Must not be negative.
    pub allocated_amount: f64,
}

/// The payload for creating a budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    /// The display name of the budget.
    pub name: String,
    /// The overall amount to allocate.
    pub amount: f64,
    /// The first day the budget covers.
    pub start_date: Date,
    /// The last day the budget covers; open-ended when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Date>,
    /// Whether unspent allocation carries over into the next period.
    pub rollover_enabled: bool,
    /// The per-category allocations.
    pub categories: Vec<BudgetCategoryAllocation>,
}

/// The payload for updating a budget. The allocation set, when present,
/// replaces the existing allocations wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBudget {
    /// A new display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// A new overall amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// A new start date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Date>,
    /// A new end date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Date>,
    /// Whether unspent allocation should carry over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollover_enabled: Option<bool>,
    /// A replacement allocation set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<BudgetCategoryAllocation>>,
}

/// Check the invariants of a budget payload: a positive amount, an end date
/// after the start date, and non-negative allocations.
pub(crate) fn validate_budget(
    amount: f64,
    start_date: Date,
    end_date: Option<Date>,
    categories: &[BudgetCategoryAllocation],
) -> Result<(), Error> {
    if amount <= 0.0 {
        return Err(Error::Validation(
            "The budget amount must be greater than zero.".to_owned(),
        ));
    }

    if let Some(end_date) = end_date
        && end_date <= start_date
    {
        return Err(Error::Validation(
            "The budget end date must be after its start date.".to_owned(),
        ));
    }

    if categories
        .iter()
        .any(|allocation| allocation.allocated_amount < 0.0)
    {
        return Err(Error::Validation(
            "Category allocations must not be negative.".to_owned(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod budget_stats_tests {
    use serde_json::json;

    use super::BudgetStats;

    #[test]
    fn percentage_over_100_is_stored_raw() {
        let stats: BudgetStats = serde_json::from_value(json!({
            "totalAllocated": 200.0,
            "totalSpent": 250.0,
            "totalRemaining": -50.0,
            "overallPercentageUsed": 125.0,
        }))
        .unwrap();

        assert_eq!(125.0, stats.overall_percentage_used);
        assert_eq!(100.0, stats.display_percentage());
    }

    #[test]
    fn display_percentage_passes_through_below_cap() {
        let stats = BudgetStats {
            total_allocated: 200.0,
            total_spent: 80.0,
            total_remaining: 120.0,
            overall_percentage_used: 40.0,
            categories: Vec::new(),
        };

        assert_eq!(40.0, stats.display_percentage());
    }
}
