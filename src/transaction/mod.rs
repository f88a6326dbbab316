//! Transactions record money moving in and out of accounts.
//!
//! Balance reconciliation lives in [reconcile]: every insert, update and
//! delete adjusts the owning account's balance in the same database
//! transaction.

mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod form;
mod reconcile;
mod transactions_page;

pub use core::{
    Transaction, TransactionBuilder, TransactionId, TransactionKind, count_transactions,
    create_transaction, create_transaction_table, delete_transaction, get_transaction,
    get_transactions_page as query_transactions_page, map_transaction_row, update_transaction,
};
pub(crate) use core::insert_transaction;
pub use create_endpoint::create_transaction_endpoint;
pub use create_page::get_create_transaction_page;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::update_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
pub use form::TransactionForm;
pub use reconcile::signed_effect;
pub use transactions_page::get_transactions_page;
