//! Categories classify transactions for budgets and reports.

mod categories_page;
mod core;
mod create_endpoint;
mod delete_endpoint;

pub use categories_page::get_categories_page;
pub use core::{
    Category, CategoryId, CategoryName, create_category, create_category_table, delete_category,
    get_all_categories, get_category,
};
pub use create_endpoint::create_category_endpoint;
pub use delete_endpoint::delete_category_endpoint;
