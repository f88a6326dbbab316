//! Importing transactions from CSV files in the export layout.

mod csv;
mod import_page;
mod import_transactions;

pub use import_page::get_import_page;
pub use import_transactions::{ImportState, import_transactions};
