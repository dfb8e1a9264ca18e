//! Transactions and their line items.
//!
//! A transaction is an expense or income event composed of one or more
//! items, each tagged with a category and an account. The server reports
//! `transactionType` and `status` in UPPER CASE; the domain enums here
//! deserialize case-insensitively and expose the lower-case form, so the
//! normalization happens once, at decode time, for every endpoint that
//! returns a transaction.

use std::fmt::{self, Display};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use time::Date;

use crate::Error;

/// The server-issued identifier of a transaction.
pub type TransactionId = String;

/// Whether money left or entered an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    /// Money spent.
    Expense,
    /// Money earned.
    Income,
}

impl TransactionType {
    /// The lower-case canonical form, as stored and as sent in queries.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
        }
    }

    /// Parse a wire value in any casing.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        match raw.to_ascii_lowercase().as_str() {
            "expense" => Ok(TransactionType::Expense),
            "income" => Ok(TransactionType::Income),
            other => Err(Error::Decode(format!(
                "\"{other}\" is not a known transaction type"
            ))),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TransactionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransactionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TransactionType::parse(&raw).map_err(de::Error::custom)
    }
}

/// Where a transaction sits in its clearance lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    /// Recorded but not yet cleared by the bank.
    Pending,
    /// Cleared by the bank.
    Cleared,
    /// Matched against a statement.
    Reconciled,
}

impl TransactionStatus {
    /// The lower-case canonical form.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Cleared => "cleared",
            TransactionStatus::Reconciled => "reconciled",
        }
    }

    /// Parse a wire value in any casing.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        match raw.to_ascii_lowercase().as_str() {
            "pending" => Ok(TransactionStatus::Pending),
            "cleared" => Ok(TransactionStatus::Cleared),
            "reconciled" => Ok(TransactionStatus::Reconciled),
            other => Err(Error::Decode(format!(
                "\"{other}\" is not a known transaction status"
            ))),
        }
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TransactionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransactionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TransactionStatus::parse(&raw).map_err(de::Error::custom)
    }
}

/// One category/account-tagged line within a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItem {
    /// The category this line is tagged with.
    pub category_id: String,
    /// The account this line moves money through.
    pub account_id: String,
    /// The positive magnitude of the line; the sign is implied by the
    /// parent transaction's type.
    pub amount: f64,
    /// Free-form detail for this line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An expense or income event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A short title describing the transaction.
    pub title: String,
    /// Whether this is an expense or income.
    #[serde(rename = "transactionType")]
    pub transaction_type: TransactionType,
    /// When the transaction happened.
    pub date: Date,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Where the transaction sits in its clearance lifecycle.
    pub status: TransactionStatus,
    /// The line items; every transaction has at least one.
    pub items: Vec<TransactionItem>,
}

impl Transaction {
    /// The total of the transaction: the sum of its item amounts.
    ///
    /// Derived on demand rather than stored, so it can never drift from the
    /// items.
    pub fn total_amount(&self) -> f64 {
        self.items.iter().map(|item| item.amount).sum()
    }
}

/// The payload for creating a transaction. The transaction and its items
/// are created atomically on the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    /// A short title describing the transaction.
    pub title: String,
    /// Whether this is an expense or income.
    #[serde(rename = "transactionType")]
    pub transaction_type: TransactionType,
    /// When the transaction happened.
    pub date: Date,
    /// Free-form notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// The initial clearance status. The server defaults to pending when
    /// absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
    /// The line items; at least one is required.
    pub items: Vec<TransactionItem>,
}

/// The payload for updating a transaction. The item set, when present,
/// replaces the existing items wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransaction {
    /// A new title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// A new type.
    #[serde(rename = "transactionType", skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<TransactionType>,
    /// A new date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
    /// New notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// A new clearance status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
    /// A replacement item set; at least one item when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<TransactionItem>>,
}

/// Check the invariants shared by create and update item sets: at least one
/// item, and strictly positive amounts.
pub(crate) fn validate_items(items: &[TransactionItem]) -> Result<(), Error> {
    if items.is_empty() {
        return Err(Error::Validation(
            "A transaction must have at least one item.".to_owned(),
        ));
    }

    if items.iter().any(|item| item.amount <= 0.0) {
        return Err(Error::Validation(
            "Every transaction item amount must be greater than zero.".to_owned(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod transaction_type_tests {
    use serde_json::json;

    use super::TransactionType;

    #[test]
    fn upper_case_wire_value_normalizes_to_lower_case() {
        let parsed: TransactionType = serde_json::from_value(json!("EXPENSE")).unwrap();

        assert_eq!(TransactionType::Expense, parsed);
        assert_eq!("expense", parsed.to_string());
    }

    #[test]
    fn mixed_case_wire_value_parses() {
        assert_eq!(
            TransactionType::Income,
            TransactionType::parse("Income").unwrap()
        );
    }

    #[test]
    fn unknown_wire_value_is_a_decode_error() {
        assert!(TransactionType::parse("transfer").is_err());
    }

    #[test]
    fn serializes_lower_case() {
        assert_eq!(
            json!("income"),
            serde_json::to_value(TransactionType::Income).unwrap()
        );
    }
}
