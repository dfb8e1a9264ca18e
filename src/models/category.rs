//! Categories and the flattening of the server's hierarchical listing.
//!
//! The server returns parents with nested `children`. The stores keep a
//! single flattened list for list rendering (depth-first, each parent
//! immediately followed by its children) and derive a compact
//! `subcategories` view on each parent for form editing.

use serde::{Deserialize, Serialize};

use crate::models::TransactionType;

/// The server-issued identifier of a category.
pub type CategoryId = String;

/// A tag for transaction items. Categories form a two-level hierarchy:
/// a category and its subcategories, which must share its transaction type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name of the category.
    pub name: String,
    /// Whether the category tags expenses or income; never both.
    #[serde(rename = "transactionType")]
    pub transaction_type: TransactionType,
    /// The icon shown next to the category.
    #[serde(default)]
    pub icon: Option<String>,
    /// The display color of the category.
    #[serde(default)]
    pub color: Option<String>,
    /// A longer description of what belongs in the category.
    #[serde(default)]
    pub description: Option<String>,
    /// The parent category, for subcategories.
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    /// The position of the category in display ordering.
    pub order_index: i64,
    /// Whether the category is active. Deleting a category that historical
    /// transactions still reference only flips this to false.
    pub is_active: bool,
    /// Whether the category was provisioned by the platform. System
    /// categories cannot be deleted.
    pub is_system: bool,
    /// A compact view of this category's subcategories, derived during
    /// flattening. Empty for subcategories.
    #[serde(default, skip_serializing)]
    pub subcategories: Vec<SubcategorySummary>,
}

/// The id/name/description/icon view of a subcategory kept on its parent
/// for form editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcategorySummary {
    /// The ID of the subcategory.
    pub id: CategoryId,
    /// The display name of the subcategory.
    pub name: String,
    /// The description of the subcategory.
    pub description: Option<String>,
    /// The icon of the subcategory.
    pub icon: Option<String>,
}

/// The wire shape of a category in hierarchical list responses: a parent
/// record carrying its children inline.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    #[serde(default)]
    pub children: Vec<Category>,
}

/// Flatten a hierarchical page depth-first, each parent immediately
/// followed by its children, preserving the server's ordering otherwise.
///
/// Parents receive their derived `subcategories` view; children receive
/// their `parent_id`.
pub(crate) fn flatten_tree(nodes: Vec<CategoryNode>) -> Vec<Category> {
    let mut flattened = Vec::new();

    for node in nodes {
        let mut parent = node.category;
        parent.subcategories = node
            .children
            .iter()
            .map(|child| SubcategorySummary {
                id: child.id.clone(),
                name: child.name.clone(),
                description: child.description.clone(),
                icon: child.icon.clone(),
            })
            .collect();

        let parent_id = parent.id.clone();
        flattened.push(parent);

        for mut child in node.children {
            child.parent_id.get_or_insert_with(|| parent_id.clone());
            flattened.push(child);
        }
    }

    flattened
}

/// The payload for creating a category or subcategory.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    /// The display name of the category.
    pub name: String,
    /// Whether the category tags expenses or income.
    #[serde(rename = "transactionType")]
    pub transaction_type: TransactionType,
    /// The icon to show next to the category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// The display color of the category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// A longer description of what belongs in the category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The parent, when creating a subcategory. Its transaction type must
    /// match the parent's.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CategoryId>,
}

/// The payload for updating a category. Absent fields are left unchanged
/// by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategory {
    /// A new display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// A new icon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// A new display color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// A new description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// A new display position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
    /// Whether the category should be active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}
