//! Serialization of filters into query-string parameters.
//!
//! The conventions the server expects: arrays are joined with commas
//! (`categoryIds=a,b,c`), numbers and booleans are stringified, and dates
//! are ISO-8601 strings. Percent-encoding of the final string is done with
//! `serde_urlencoded` over the accumulated pairs.

use time::Date;

/// An ordered collection of query parameters under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    /// An empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, stringifying the value.
    pub fn push(&mut self, key: &str, value: impl ToString) {
        self.params.push((key.to_owned(), value.to_string()));
    }

    /// Append a parameter when the value is present.
    pub fn push_opt(&mut self, key: &str, value: Option<impl ToString>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    /// Append a comma-joined list parameter when the list is non-empty.
    pub fn push_list<V: ToString>(&mut self, key: &str, values: &[V]) {
        if values.is_empty() {
            return;
        }

        let joined = values
            .iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.params.push((key.to_owned(), joined));
    }

    /// Append a date parameter as an ISO-8601 calendar date when present.
    pub fn push_date(&mut self, key: &str, value: Option<Date>) {
        if let Some(date) = value {
            self.push(key, date);
        }
    }

    /// The accumulated key/value pairs, in insertion order.
    pub fn into_params(self) -> Vec<(String, String)> {
        self.params
    }

    /// Percent-encode the parameters into a query string without the
    /// leading `?`.
    pub fn encode(&self) -> String {
        // Pairs of strings cannot fail to serialize.
        serde_urlencoded::to_string(&self.params).unwrap_or_default()
    }
}
