// 🏷️ Category Rollup - top N plus an "Other" bucket

use serde::{Deserialize, Serialize};

/// How many ranked categories are reported individually.
pub const TOP_CATEGORY_COUNT: usize = 3;

/// Name of the synthetic tail bucket.
pub const OTHER_CATEGORY_NAME: &str = "Other";

/// Absolute spend for one category. `value` is never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub name: String,
    pub value: i64,
}

impl CategorySpend {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        CategorySpend {
            name: name.into(),
            value,
        }
    }
}

/// Reduce a list already sorted by spend (descending) to the top entries
/// plus one `Other` entry carrying the sum of everything after them.
///
/// Lists of `TOP_CATEGORY_COUNT` or fewer come back unchanged.
pub fn rollup_categories(mut ranked: Vec<CategorySpend>) -> Vec<CategorySpend> {
    if ranked.len() <= TOP_CATEGORY_COUNT {
        return ranked;
    }

    let tail = ranked.split_off(TOP_CATEGORY_COUNT);
    let other: i64 = tail.iter().map(|c| c.value).sum();
    ranked.push(CategorySpend::new(OTHER_CATEGORY_NAME, other));
    ranked
}
