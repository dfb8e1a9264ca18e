//! Monetary accounts and the payloads that create and update them.

use serde::{Deserialize, Serialize};

use crate::models::Transaction;

/// The server-issued identifier of an account.
pub type AccountId = String;

/// The amount of money available in a bank account, wallet or card.
///
/// The balance is mutated only by the server, as a side effect of
/// transaction mutations; the client caches it and re-fetches after every
/// money-moving operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// The ID of the account.
    pub id: AccountId,
    /// The display name of the account.
    pub name: String,
    /// The bank's account number, when the user recorded one.
    #[serde(default)]
    pub account_number: Option<String>,
    /// The icon shown next to the account.
    #[serde(default)]
    pub icon: Option<String>,
    /// The display color of the account.
    #[serde(default)]
    pub color: Option<String>,
    /// The current balance as computed by the server.
    pub balance: f64,
    /// The ISO currency code of the balance.
    pub currency: String,
    /// Whether the account is active. Inactive accounts are soft-disabled,
    /// never hard-deleted.
    pub is_active: bool,
    /// Whether the account was provisioned by the platform (e.g. the
    /// default Cash account). System accounts cannot be deleted.
    pub is_system: bool,
}

/// A single account together with its recent transactions, for detail
/// views.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetails {
    /// The account.
    pub account: Account,
    /// The most recent transactions touching this account.
    #[serde(default)]
    pub recent_transactions: Vec<Transaction>,
}

/// The payload for creating an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    /// The display name of the account.
    pub name: String,
    /// The bank's account number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    /// The icon to show next to the account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// The display color of the account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// The opening balance.
    pub balance: f64,
    /// The ISO currency code of the account.
    pub currency: String,
}

/// The payload for updating an account. Absent fields are left unchanged
/// by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccount {
    /// A new display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// A new account number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    /// A new icon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// A new display color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Whether the account should be active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod account_tests {
    use serde_json::json;

    use super::{Account, AccountDetails};

    #[test]
    fn decodes_account_with_optional_fields_absent() {
        let account: Account = serde_json::from_value(json!({
            "id": "a-1",
            "name": "Cash",
            "balance": 120.0,
            "currency": "NZD",
            "isActive": true,
            "isSystem": true,
        }))
        .unwrap();

        assert_eq!("Cash", account.name);
        assert_eq!(None, account.account_number);
        assert!(account.is_system);
    }

    #[test]
    fn account_details_normalizes_embedded_transaction_types() {
        let details: AccountDetails = serde_json::from_value(json!({
            "account": {
                "id": "a-1",
                "name": "Cash",
                "balance": 120.0,
                "currency": "NZD",
                "isActive": true,
                "isSystem": true,
            },
            "recentTransactions": [{
                "id": "t-1",
                "title": "Rent",
                "transactionType": "EXPENSE",
                "date": "2025-04-01",
                "status": "PENDING",
                "items": [
                    { "categoryId": "c-1", "accountId": "a-1", "amount": 450.0 },
                ],
            }],
        }))
        .unwrap();

        assert_eq!(
            "expense",
            details.recent_transactions[0].transaction_type.to_string()
        );
    }
}
