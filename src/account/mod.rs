//! Accounts hold a running balance and own transactions.
//!
//! Each submodule pairs a page with the endpoint that serves its form, the
//! same way the transaction and rule modules are laid out.

mod accounts_page;
mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod detail_page;
mod edit_endpoint;
mod edit_page;

pub use accounts_page::get_accounts_page;
pub use core::{
    Account, AccountId, AccountKind, count_account_transactions, create_account_table,
    get_account, get_all_accounts, get_total_account_balance, map_row_to_account,
    reconciled_balance,
};
pub use create_endpoint::{AccountForm, create_account, create_account_endpoint};
pub use create_page::get_create_account_page;
pub use delete_endpoint::delete_account_endpoint;
pub use detail_page::get_account_detail_page;
pub use edit_endpoint::edit_account_endpoint;
pub use edit_page::get_edit_account_page;
