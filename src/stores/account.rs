//! The store that owns the list of monetary accounts and their cached
//! balances.
//!
//! Balances are computed by the server as a side effect of transaction
//! mutations, so this store only ever re-fetches; it never patches a
//! balance locally.

use std::sync::{Arc, Mutex};

use crate::{
    Error, api,
    api::{ApiRequest, ApiTransport},
    endpoints,
    models::{Account, AccountDetails, NewAccount, UpdateAccount},
    stores::BalanceRefresh,
};

/// The state slice owned by the account store.
#[derive(Debug, Default)]
struct AccountState {
    accounts: Vec<Account>,
    selected: Option<AccountDetails>,
    is_loading: bool,
    error: Option<String>,
    success_message: Option<String>,
}

/// Caches the account list and applies mutations to it by ID.
///
/// Accounts are a small collection, so [AccountStore::get_accounts] always
/// replaces the whole list without pagination.
pub struct AccountStore<T> {
    api: Arc<T>,
    state: Mutex<AccountState>,
}

impl<T: ApiTransport + Send + Sync> AccountStore<T> {
    /// Create an account store that talks through `api`.
    pub fn new(api: Arc<T>) -> Self {
        Self {
            api,
            state: Mutex::new(AccountState::default()),
        }
    }

    /// Fetch and replace the full account list.
    ///
    /// Read contract: failures are recorded in [AccountStore::error] and
    /// never propagated; the cached list is left untouched on failure.
    pub async fn get_accounts(&self) {
        self.begin(true);

        let result = api::execute(
            self.api.as_ref(),
            ApiRequest::get(endpoints::ACCOUNTS, Vec::new()),
        )
        .await
        .and_then(|response| api::decode_data::<Vec<Account>>(response.data));

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(accounts) => state.accounts = accounts,
            Err(error) => state.error = Some(error.to_string()),
        }
    }

    /// Fetch a single account plus its recent transactions for detail
    /// views. Read contract.
    pub async fn get_account_details(&self, account_id: &str) {
        self.begin(true);

        let result = api::execute(
            self.api.as_ref(),
            ApiRequest::get(endpoints::account(account_id), Vec::new()),
        )
        .await
        .and_then(|response| api::decode_data::<AccountDetails>(response.data));

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(details) => state.selected = Some(details),
            Err(error) => state.error = Some(error.to_string()),
        }
    }

    /// Create an account and insert it into the cached list.
    ///
    /// Mutation contract: the normalized error message is recorded in state
    /// and the error is also returned, so the calling screen can react
    /// locally.
    pub async fn create_account(&self, new_account: NewAccount) -> Result<Account, Error> {
        let body = serde_json::to_value(&new_account)?;
        self.begin(true);

        let result = api::execute(self.api.as_ref(), ApiRequest::post(endpoints::ACCOUNTS, body))
            .await
            .and_then(|response| {
                let account = api::decode_data::<Account>(response.data)?;
                Ok((account, response.message))
            });

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok((account, message)) => {
                state.accounts.push(account.clone());
                state.success_message =
                    Some(message.unwrap_or_else(|| "Account created.".to_owned()));
                Ok(account)
            }
            Err(error) => {
                state.error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// Update an account and replace it in the cached list by ID.
    /// Mutation contract.
    pub async fn update_account(
        &self,
        account_id: &str,
        update: UpdateAccount,
    ) -> Result<Account, Error> {
        let body = serde_json::to_value(&update)?;
        self.begin(true);

        let result = api::execute(
            self.api.as_ref(),
            ApiRequest::put(endpoints::account(account_id), body),
        )
        .await
        .and_then(|response| {
            let account = api::decode_data::<Account>(response.data)?;
            Ok((account, response.message))
        });

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok((account, message)) => {
                if let Some(existing) = state
                    .accounts
                    .iter_mut()
                    .find(|existing| existing.id == account.id)
                {
                    *existing = account.clone();
                }
                state.success_message =
                    Some(message.unwrap_or_else(|| "Account updated.".to_owned()));
                Ok(account)
            }
            Err(error) => {
                state.error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// Delete an account and remove it from the cached list.
    ///
    /// System-provisioned accounts (e.g. the default Cash account) are
    /// refused locally without a network call. Mutation contract.
    pub async fn delete_account(&self, account_id: &str) -> Result<(), Error> {
        let is_system = {
            let state = self.state.lock().unwrap();
            state
                .accounts
                .iter()
                .any(|account| account.id == account_id && account.is_system)
        };

        if is_system {
            let error = Error::Validation("System accounts cannot be deleted.".to_owned());
            self.state.lock().unwrap().error = Some(error.to_string());
            return Err(error);
        }

        self.begin(true);

        let result = api::execute(
            self.api.as_ref(),
            ApiRequest::delete(endpoints::account(account_id)),
        )
        .await;

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(response) => {
                state.accounts.retain(|account| account.id != account_id);
                state.success_message = Some(
                    response
                        .message
                        .unwrap_or_else(|| "Account deleted.".to_owned()),
                );
                Ok(())
            }
            Err(error) => {
                state.error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// A snapshot of the cached account list.
    pub fn accounts(&self) -> Vec<Account> {
        self.state.lock().unwrap().accounts.clone()
    }

    /// A snapshot of the most recently fetched account details.
    pub fn selected_account(&self) -> Option<AccountDetails> {
        self.state.lock().unwrap().selected.clone()
    }

    /// Whether a request is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.lock().unwrap().is_loading
    }

    /// The normalized message of the most recent failure.
    pub fn error(&self) -> Option<String> {
        self.state.lock().unwrap().error.clone()
    }

    /// The server's message for the most recent successful mutation.
    pub fn success_message(&self) -> Option<String> {
        self.state.lock().unwrap().success_message.clone()
    }

    fn begin(&self, loading: bool) {
        let mut state = self.state.lock().unwrap();
        state.is_loading = loading;
        state.error = None;
        state.success_message = None;
    }
}

impl<T: ApiTransport + Send + Sync> BalanceRefresh for AccountStore<T> {
    async fn refresh_balances(&self) {
        self.get_accounts().await;
    }
}
