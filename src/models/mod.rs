//! The domain models cached by the [stores](crate::stores).

mod account;
mod budget;
mod category;
mod transaction;

pub use account::{Account, AccountDetails, AccountId, NewAccount, UpdateAccount};
pub use budget::{
    Budget, BudgetCategory, BudgetCategoryAllocation, BudgetId, BudgetStats, CategoryBudgetStats,
    NewBudget, OverallBudgetStats, UpdateBudget,
};
pub use category::{Category, CategoryId, NewCategory, SubcategorySummary, UpdateCategory};
pub use transaction::{
    NewTransaction, Transaction, TransactionId, TransactionItem, TransactionStatus,
    TransactionType, UpdateTransaction,
};

pub(crate) use budget::{BudgetWithStats, validate_budget};
pub(crate) use category::{CategoryNode, flatten_tree};
pub(crate) use transaction::validate_items;
