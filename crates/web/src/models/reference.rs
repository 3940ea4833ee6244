//! Static catalogue vocabulary: categories, scenes, materials and crafts.

use rosewood_core::{FirstCategoryId, SecondCategoryId};

/// One entry of a reference table, as offered in a form select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub id: i32,
    pub name: String,
}

/// A second-level category with its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondCategory {
    pub id: SecondCategoryId,
    pub name: String,
    pub first_category_id: FirstCategoryId,
}

/// Everything the item form needs to render its selects.
#[derive(Debug, Clone, Default)]
pub struct ItemFormOptions {
    pub materials: Vec<Choice>,
    pub second_categories: Vec<Choice>,
    pub second_scenes: Vec<Choice>,
    pub styles: Vec<Choice>,
    pub stoves: Vec<Choice>,
    pub carves: Vec<Choice>,
    pub sands: Vec<Choice>,
    pub paints: Vec<Choice>,
    pub decorations: Vec<Choice>,
    pub tenons: Vec<Choice>,
}
