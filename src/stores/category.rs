//! The store that owns the category tree used to tag transaction items.
//!
//! The server returns a hierarchical page; this store keeps the flattened
//! ordering for list rendering and patches it in place on mutations.
//! Deleting a category that historical transactions still reference is a
//! deactivation, not a removal: the server returns the record flagged
//! inactive and the store updates it in place.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::{
    Error, api,
    api::{ApiRequest, ApiTransport, Query},
    endpoints,
    models::{Category, CategoryNode, NewCategory, SubcategorySummary, TransactionType, UpdateCategory},
    models::flatten_tree,
};

/// The page size requested when a query does not specify one.
const DEFAULT_CATEGORY_PAGE_SIZE: u64 = 50;

/// Filters for listing categories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryQuery {
    /// Only categories of this transaction type.
    pub transaction_type: Option<TransactionType>,
    /// Include soft-deleted categories.
    pub include_inactive: Option<bool>,
    /// Free-text search over names and descriptions.
    pub search: Option<String>,
    /// Records per page; the store default applies when absent.
    pub limit: Option<u64>,
}

impl CategoryQuery {
    /// Serialize the filters, paging from `offset`.
    ///
    /// The offset counts flattened records, matching what the server's
    /// `meta.total` counts.
    fn to_query(&self, offset: u64) -> Query {
        let mut query = Query::new();
        query.push_opt("type", self.transaction_type);
        query.push_opt("includeInactive", self.include_inactive);
        query.push_opt("search", self.search.clone());
        query.push("limit", self.limit.unwrap_or(DEFAULT_CATEGORY_PAGE_SIZE));
        query.push("offset", offset);
        query
    }
}

/// The state slice owned by the category store.
#[derive(Debug, Default)]
struct CategoryState {
    categories: Vec<Category>,
    total: u64,
    has_more: bool,
    is_loading: bool,
    is_loading_more: bool,
    error: Option<String>,
    success_message: Option<String>,
}

/// Caches the flattened category list and its per-parent subcategory views.
pub struct CategoryStore<T> {
    api: Arc<T>,
    state: Mutex<CategoryState>,
}

impl<T: ApiTransport + Send + Sync> CategoryStore<T> {
    /// Create a category store that talks through `api`.
    pub fn new(api: Arc<T>) -> Self {
        Self {
            api,
            state: Mutex::new(CategoryState::default()),
        }
    }

    /// Fetch the first page of the hierarchy, flatten it depth-first and
    /// replace the cached list. Read contract: failures are recorded, not
    /// propagated.
    pub async fn get_categories(&self, query: &CategoryQuery) {
        {
            let mut state = self.state.lock().unwrap();
            state.is_loading = true;
            state.error = None;
            state.success_message = None;
        }

        let request = ApiRequest::get(endpoints::CATEGORIES, query.to_query(0).into_params());
        let result = api::execute(self.api.as_ref(), request)
            .await
            .and_then(|response| api::decode_page::<CategoryNode>(response.data));

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(page) => {
                state.categories = flatten_tree(page.data);
                state.total = page.meta.total;
                state.has_more = (state.categories.len() as u64) < state.total;
            }
            Err(error) => state.error = Some(error.to_string()),
        }
    }

    /// Fetch the next page, using the current flattened length as the
    /// offset, and append it, deduplicating by ID.
    ///
    /// The dedup guards against server-side drift producing overlapping
    /// pages. No-op without a network call when the list is exhausted.
    pub async fn load_more_categories(&self, query: &CategoryQuery) {
        let offset = {
            let mut state = self.state.lock().unwrap();
            if !state.has_more || state.is_loading_more {
                return;
            }
            state.is_loading_more = true;
            state.error = None;
            state.categories.len() as u64
        };

        let request = ApiRequest::get(endpoints::CATEGORIES, query.to_query(offset).into_params());
        let result = api::execute(self.api.as_ref(), request)
            .await
            .and_then(|response| api::decode_page::<CategoryNode>(response.data));

        let mut state = self.state.lock().unwrap();
        state.is_loading_more = false;
        match result {
            Ok(page) => {
                let seen: HashSet<String> = state
                    .categories
                    .iter()
                    .map(|category| category.id.clone())
                    .collect();

                state.categories.extend(
                    flatten_tree(page.data)
                        .into_iter()
                        .filter(|category| !seen.contains(&category.id)),
                );
                state.total = page.meta.total;
                state.has_more = (state.categories.len() as u64) < state.total;
            }
            Err(error) => state.error = Some(error.to_string()),
        }
    }

    /// Create a category or subcategory and splice it into the flattened
    /// list. Mutation contract.
    ///
    /// Validated locally: the name must not be empty, and a subcategory's
    /// transaction type must match its parent's when the parent is loaded.
    pub async fn create_category(&self, new_category: NewCategory) -> Result<Category, Error> {
        if new_category.name.trim().is_empty() {
            return Err(self.record_error(Error::Validation(
                "Category name cannot be empty.".to_owned(),
            )));
        }

        if let Some(parent_id) = &new_category.parent_id {
            let parent_type = {
                let state = self.state.lock().unwrap();
                state
                    .categories
                    .iter()
                    .find(|category| &category.id == parent_id)
                    .map(|parent| parent.transaction_type)
            };

            if let Some(parent_type) = parent_type
                && parent_type != new_category.transaction_type
            {
                return Err(self.record_error(Error::Validation(
                    "A subcategory must have the same type as its parent.".to_owned(),
                )));
            }
        }

        let body = serde_json::to_value(&new_category)?;
        self.begin_mutation();

        let result = api::execute(
            self.api.as_ref(),
            ApiRequest::post(endpoints::CATEGORIES, body),
        )
        .await
        .and_then(|response| {
            let category = api::decode_data::<Category>(response.data)?;
            Ok((category, response.message))
        });

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok((category, message)) => {
                insert_category(&mut state.categories, category.clone());
                state.total += 1;
                state.success_message =
                    Some(message.unwrap_or_else(|| "Category created.".to_owned()));
                Ok(category)
            }
            Err(error) => {
                state.error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// Update a category and replace it in place. Mutation contract.
    pub async fn update_category(
        &self,
        category_id: &str,
        update: UpdateCategory,
    ) -> Result<Category, Error> {
        let body = serde_json::to_value(&update)?;
        self.begin_mutation();

        let result = api::execute(
            self.api.as_ref(),
            ApiRequest::put(endpoints::category(category_id), body),
        )
        .await
        .and_then(|response| {
            let category = api::decode_data::<Category>(response.data)?;
            Ok((category, response.message))
        });

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok((category, message)) => {
                replace_category(&mut state.categories, &category);
                state.success_message =
                    Some(message.unwrap_or_else(|| "Category updated.".to_owned()));
                Ok(category)
            }
            Err(error) => {
                state.error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// Delete a category.
    ///
    /// When transactions still reference the category, the server only
    /// deactivates it and returns the updated record; the store then
    /// updates it in place rather than removing it. Only a true hard delete
    /// (no record in the response) removes the category, and for a parent,
    /// its children. System categories are refused locally. Mutation
    /// contract.
    pub async fn delete_category(&self, category_id: &str) -> Result<(), Error> {
        let is_system = {
            let state = self.state.lock().unwrap();
            state
                .categories
                .iter()
                .any(|category| category.id == category_id && category.is_system)
        };

        if is_system {
            return Err(self.record_error(Error::Validation(
                "System categories cannot be deleted.".to_owned(),
            )));
        }

        self.begin_mutation();

        let result = api::execute(
            self.api.as_ref(),
            ApiRequest::delete(endpoints::category(category_id)),
        )
        .await;

        let mut state = self.state.lock().unwrap();
        state.is_loading = false;
        match result {
            Ok(response) => {
                let deactivated = api::decode_data::<Option<Category>>(response.data)
                    .ok()
                    .flatten();

                match deactivated {
                    // Soft delete: flagged inactive server-side, kept in
                    // state for historical transactions.
                    Some(category) => replace_category(&mut state.categories, &category),
                    None => remove_category(&mut state.categories, category_id),
                }

                state.success_message = Some(
                    response
                        .message
                        .unwrap_or_else(|| "Category deleted.".to_owned()),
                );
                Ok(())
            }
            Err(error) => {
                state.error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// A snapshot of the flattened category list.
    pub fn categories(&self) -> Vec<Category> {
        self.state.lock().unwrap().categories.clone()
    }

    /// Whether a further page can be requested.
    pub fn has_more(&self) -> bool {
        self.state.lock().unwrap().has_more
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

    fn record_error(&self, error: Error) -> Error {
        self.state.lock().unwrap().error = Some(error.to_string());
        error
    }
}

/// Splice a created category into the flattened ordering: parents at the
/// end, subcategories directly after their parent's existing children, with
/// the parent's subcategory view kept in sync.
fn insert_category(categories: &mut Vec<Category>, category: Category) {
    let Some(parent_id) = category.parent_id.clone() else {
        categories.push(category);
        return;
    };

    let Some(parent_index) = categories.iter().position(|c| c.id == parent_id) else {
        categories.push(category);
        return;
    };

    categories[parent_index].subcategories.push(SubcategorySummary {
        id: category.id.clone(),
        name: category.name.clone(),
        description: category.description.clone(),
        icon: category.icon.clone(),
    });

    let mut insert_at = parent_index + 1;
    while insert_at < categories.len()
        && categories[insert_at].parent_id.as_deref() == Some(parent_id.as_str())
    {
        insert_at += 1;
    }
    categories.insert(insert_at, category);
}

/// Replace a category in place, preserving a parent's derived subcategory
/// view and keeping its parent's view of it current.
fn replace_category(categories: &mut [Category], category: &Category) {
    if let Some(existing) = categories.iter_mut().find(|c| c.id == category.id) {
        let subcategories = std::mem::take(&mut existing.subcategories);
        *existing = category.clone();
        existing.subcategories = subcategories;
    }

    if let Some(parent_id) = &category.parent_id
        && let Some(parent) = categories.iter_mut().find(|c| &c.id == parent_id)
        && let Some(summary) = parent
            .subcategories
            .iter_mut()
            .find(|summary| summary.id == category.id)
    {
        summary.name = category.name.clone();
        summary.description = category.description.clone();
        summary.icon = category.icon.clone();
    }
}

/// Remove a hard-deleted category: a parent takes its children with it, a
/// subcategory is also dropped from its parent's view.
fn remove_category(categories: &mut Vec<Category>, category_id: &str) {
    let parent_id = categories
        .iter()
        .find(|category| category.id == category_id)
        .and_then(|category| category.parent_id.clone());

    categories.retain(|category| {
        category.id != category_id && category.parent_id.as_deref() != Some(category_id)
    });

    if let Some(parent_id) = parent_id
        && let Some(parent) = categories.iter_mut().find(|c| c.id == parent_id)
    {
        parent.subcategories.retain(|summary| summary.id != category_id);
    }
}

#[cfg(test)]
mod category_store_tests {
    use std::sync::Arc;

    use serde_json::{Value, json};

    use crate::{
        models::TransactionType,
        test_utils::{FakeTransport, envelope_ok, envelope_page},
    };

    use super::{CategoryQuery, CategoryStore};

    fn category_json(id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "transactionType": "EXPENSE",
            "orderIndex": 0,
            "isActive": true,
            "isSystem": false,
        })
    }

    fn parent_json(id: &str, name: &str, children: Vec<Value>) -> Value {
        let mut parent = category_json(id, name);
        parent["children"] = Value::Array(children);
        parent
    }

    #[tokio::test]
    async fn get_categories_flattens_parent_before_children() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_ok(envelope_page(
            json!([parent_json("c-1", "Food", vec![category_json("c-2", "Groceries")])]),
            2,
            1,
            50,
            1,
        ));
        let store = CategoryStore::new(transport);

        store.get_categories(&CategoryQuery::default()).await;

        let ids: Vec<String> = store.categories().iter().map(|c| c.id.clone()).collect();
        assert_eq!(vec!["c-1".to_owned(), "c-2".to_owned()], ids);
        assert!(!store.has_more());
    }

    #[tokio::test]
    async fn load_more_uses_flattened_length_as_offset_and_dedups() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_ok(envelope_page(
            json!([parent_json("c-1", "Food", vec![category_json("c-2", "Groceries")])]),
            4,
            1,
            2,
            2,
        ));
        // The second page overlaps the first by one record.
        transport.push_ok(envelope_page(
            json!([category_json("c-2", "Groceries"), category_json("c-3", "Rent")]),
            4,
            2,
            2,
            2,
        ));
        let store = CategoryStore::new(Arc::clone(&transport));
        let query = CategoryQuery {
            limit: Some(2),
            ..CategoryQuery::default()
        };

        store.get_categories(&query).await;
        store.load_more_categories(&query).await;

        let ids: Vec<String> = store.categories().iter().map(|c| c.id.clone()).collect();
        assert_eq!(
            vec!["c-1".to_owned(), "c-2".to_owned(), "c-3".to_owned()],
            ids
        );

        let second_request = &transport.requests()[1];
        assert!(
            second_request
                .query
                .contains(&("offset".to_owned(), "2".to_owned()))
        );
    }

    #[tokio::test]
    async fn load_more_is_a_no_op_when_exhausted() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_ok(envelope_page(
            json!([category_json("c-1", "Food")]),
            1,
            1,
            50,
            1,
        ));
        let store = CategoryStore::new(Arc::clone(&transport));

        store.get_categories(&CategoryQuery::default()).await;
        let requests_before = transport.request_count();

        store.load_more_categories(&CategoryQuery::default()).await;

        assert_eq!(requests_before, transport.request_count());
        assert_eq!(1, store.categories().len());
    }

    #[tokio::test]
    async fn soft_delete_updates_the_record_in_place() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_ok(envelope_page(json!([category_json("c-1", "Food")]), 1, 1, 50, 1));

        let mut deactivated = category_json("c-1", "Food");
        deactivated["isActive"] = json!(false);
        transport.push_ok(envelope_ok(Some("Category deactivated."), deactivated));

        let store = CategoryStore::new(transport);
        store.get_categories(&CategoryQuery::default()).await;

        store.delete_category("c-1").await.unwrap();

        let categories = store.categories();
        assert_eq!(1, categories.len());
        assert!(!categories[0].is_active);
    }

    #[tokio::test]
    async fn hard_delete_removes_a_parent_and_its_children() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_ok(envelope_page(
            json!([
                parent_json("c-1", "Food", vec![category_json("c-2", "Groceries")]),
                category_json("c-3", "Rent"),
            ]),
            3,
            1,
            50,
            1,
        ));
        transport.push_ok(envelope_ok(Some("Category deleted."), json!(null)));

        let store = CategoryStore::new(transport);
        store.get_categories(&CategoryQuery::default()).await;

        store.delete_category("c-1").await.unwrap();

        let ids: Vec<String> = store.categories().iter().map(|c| c.id.clone()).collect();
        assert_eq!(vec!["c-3".to_owned()], ids);
    }

    #[tokio::test]
    async fn subcategory_with_mismatched_type_is_rejected_without_a_request() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_ok(envelope_page(json!([category_json("c-1", "Food")]), 1, 1, 50, 1));
        let store = CategoryStore::new(Arc::clone(&transport));
        store.get_categories(&CategoryQuery::default()).await;
        let requests_before = transport.request_count();

        let result = store
            .create_category(crate::models::NewCategory {
                name: "Refunds".to_owned(),
                transaction_type: TransactionType::Income,
                icon: None,
                color: None,
                description: None,
                parent_id: Some("c-1".to_owned()),
            })
            .await;

        assert!(result.is_err());
        assert_eq!(requests_before, transport.request_count());
    }

    #[tokio::test]
    async fn created_subcategory_lands_after_its_parents_children() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_ok(envelope_page(
            json!([
                parent_json("c-1", "Food", vec![category_json("c-2", "Groceries")]),
                category_json("c-3", "Rent"),
            ]),
            3,
            1,
            50,
            1,
        ));

        let mut created = category_json("c-4", "Takeaways");
        created["parentId"] = json!("c-1");
        transport.push_ok(envelope_ok(Some("Category created."), created));

        let store = CategoryStore::new(transport);
        store.get_categories(&CategoryQuery::default()).await;

        store
            .create_category(crate::models::NewCategory {
                name: "Takeaways".to_owned(),
                transaction_type: TransactionType::Expense,
                icon: None,
                color: None,
                description: None,
                parent_id: Some("c-1".to_owned()),
            })
            .await
            .unwrap();

        let ids: Vec<String> = store.categories().iter().map(|c| c.id.clone()).collect();
        assert_eq!(
            vec![
                "c-1".to_owned(),
                "c-2".to_owned(),
                "c-4".to_owned(),
                "c-3".to_owned()
            ],
            ids
        );

        let parent = &store.categories()[0];
        assert_eq!(2, parent.subcategories.len());
    }
}
