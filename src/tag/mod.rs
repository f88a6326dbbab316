//! Free-form tags for transactions.

mod core;
mod tags_page;

pub use core::{Tag, TagId, create_tag_tables, get_all_tags, process_tags, tags_for_transaction};
pub use tags_page::get_tags_page;
