//! Turns due recurring rules into concrete transactions.
//!
//! The batch path is run by the `process_recurring` binary from cron and
//! catches up on every period that has elapsed since a rule was last
//! processed. The manual path backs the "fire now" button on the rules page.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    transaction::{Transaction, insert_transaction},
};

use super::core::{
    RecurringRule, RecurringRuleId, advance_date, get_due_rules, get_recurring_rule,
    mark_rule_processed,
};

/// Process every due rule, creating one transaction per elapsed period.
///
/// A rule due several periods ago fires once per period, each transaction
/// dated at its period's due date, until the rule's next due date is in the
/// future. Everything runs inside a single database transaction, so a failure
/// for any rule rolls back the entire batch.
///
/// Returns the number of transactions created.
pub fn process_due_rules(today: Date, connection: &Connection) -> Result<u64, Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let due_rules = get_due_rules(today, &sql_transaction)?;

    let mut created_count = 0;
    for rule in due_rules {
        created_count += catch_up_rule(&rule, today, &sql_transaction)?;
    }

    sql_transaction.commit()?;

    tracing::info!("created {created_count} transaction(s) from recurring rules");

    Ok(created_count)
}

/// Fire every elapsed period of a single rule. The caller manages the
/// database transaction.
fn catch_up_rule(
    rule: &RecurringRule,
    today: Date,
    connection: &Connection,
) -> Result<u64, Error> {
    let mut due_date = rule.next_due_date;
    let mut created_count = 0;
    let mut last_processed = None;

    while due_date <= today {
        let builder = Transaction::build(
            rule.amount,
            rule.kind,
            due_date,
            &rule.description,
            rule.account_id,
        )
        .category_id(rule.category_id);

        insert_transaction(builder, connection).inspect_err(|error| {
            tracing::error!("could not fire recurring rule {}: {error}", rule.id)
        })?;

        created_count += 1;
        last_processed = Some(due_date);
        due_date = advance_date(due_date, rule.interval);
    }

    if let Some(processed_date) = last_processed {
        mark_rule_processed(rule.id, processed_date, due_date, connection)?;
    }

    Ok(created_count)
}

/// Fire a rule once, immediately, with the transaction dated today.
///
/// The rule does not have to be due. Its next due date advances by one
/// interval so the fired period is not processed again by the batch job.
pub fn fire_rule(
    rule_id: RecurringRuleId,
    today: Date,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let rule = get_recurring_rule(rule_id, &sql_transaction)?;

    let builder = Transaction::build(
        rule.amount,
        rule.kind,
        today,
        &rule.description,
        rule.account_id,
    )
    .category_id(rule.category_id);

    let transaction = insert_transaction(builder, &sql_transaction)?;

    let next_due = advance_date(rule.next_due_date, rule.interval);
    mark_rule_processed(rule.id, today, next_due, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(transaction)
}
