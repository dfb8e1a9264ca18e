//! Contains the state stores that cache the domain [models](crate::models)
//! and keep derived views consistent across mutations.
//!
//! Each store exclusively owns its in-memory slice. Cross-references between
//! entities are resolved by ID against the owning store's current snapshot,
//! never by held object reference, so a balance update in the account store
//! is visible everywhere without patching other stores' caches.

mod account;
mod budget;
mod category;
mod transaction;

pub use account::AccountStore;
pub use budget::{BudgetQuery, BudgetStore};
pub use category::{CategoryQuery, CategoryStore};
pub use transaction::{SortOrder, TransactionQuery, TransactionSortKey, TransactionStore};

use std::future::Future;

/// Reacts to a money-moving mutation by re-fetching server-computed
/// balances.
///
/// [TransactionStore](transaction::TransactionStore) calls this exactly once
/// after every successful create, update or delete, making the cross-store
/// dependency an explicit, injectable seam rather than a hidden import.
/// Implementations must not let a refresh failure escape; the mutation that
/// triggered the refresh already succeeded and must be reported as such.
pub trait BalanceRefresh {
    /// Re-fetch account balances. Failures are recorded by the implementer.
    fn refresh_balances(&self) -> impl Future<Output = ()> + Send;
}
