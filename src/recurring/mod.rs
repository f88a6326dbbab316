//! Rules for transactions that repeat on a schedule, and the engine that
//! turns due rules into concrete transactions.

mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod engine;
mod fire_endpoint;
mod form;
mod rules_page;

pub use core::{
    Interval, RecurringRule, RecurringRuleDraft, RecurringRuleId, advance_date,
    create_recurring_rule, create_recurring_rule_table, delete_recurring_rule,
    get_all_recurring_rules, get_due_rules, get_recurring_rule, update_recurring_rule,
};
pub use create_endpoint::create_recurring_endpoint;
pub use create_page::get_create_recurring_page;
pub use delete_endpoint::delete_recurring_endpoint;
pub use edit_endpoint::update_recurring_endpoint;
pub use edit_page::get_edit_recurring_page;
pub use engine::{fire_rule, process_due_rules};
pub use fire_endpoint::fire_recurring_endpoint;
pub use form::RecurringRuleForm;
pub use rules_page::get_recurring_page;
