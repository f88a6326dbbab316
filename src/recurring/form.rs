//! The shared form fields for creating and editing recurring rules.

use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    account::{Account, AccountId},
    category::{Category, CategoryId},
    html::{FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE},
    transaction::TransactionKind,
};

use super::core::{Interval, RecurringRule, RecurringRuleDraft};

/// The form data for creating or editing a recurring rule.
#[derive(Debug, Deserialize)]
pub struct RecurringRuleForm {
    /// The value of each generated transaction in dollars. Always positive.
    pub amount: f64,
    /// Whether the generated transactions are income or expenses.
    pub kind: TransactionKind,
    /// How often the rule fires.
    pub interval: Interval,
    /// Text detailing the rule, copied onto each generated transaction.
    pub description: String,
    /// The first date the rule is due.
    pub start_date: Date,
    /// The account the generated transactions belong to.
    pub account_id: AccountId,
    /// The category of the generated transactions, if any.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

impl RecurringRuleForm {
    /// Convert the form data into a [RecurringRuleDraft].
    pub fn to_draft(&self) -> RecurringRuleDraft {
        RecurringRuleDraft {
            amount: self.amount,
            kind: self.kind,
            interval: self.interval,
            description: self.description.clone(),
            start_date: self.start_date,
            account_id: self.account_id,
            category_id: self.category_id,
        }
    }
}

/// The values to prefill the recurring rule form with.
pub(crate) struct RuleFormPrefill {
    pub amount: Option<f64>,
    pub kind: TransactionKind,
    pub interval: Interval,
    pub description: String,
    pub start_date: Date,
    pub account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
}

impl RuleFormPrefill {
    /// An empty form defaulting to a monthly expense starting today.
    pub fn empty(today: Date) -> Self {
        Self {
            amount: None,
            kind: TransactionKind::Expense,
            interval: Interval::Monthly,
            description: String::new(),
            start_date: today,
            account_id: None,
            category_id: None,
        }
    }

    /// Prefill from an existing rule.
    pub fn from_rule(rule: &RecurringRule) -> Self {
        Self {
            amount: Some(rule.amount),
            kind: rule.kind,
            interval: rule.interval,
            description: rule.description.clone(),
            start_date: rule.start_date,
            account_id: Some(rule.account_id),
            category_id: rule.category_id,
        }
    }
}

/// Render the form fields shared by the create and edit rule pages.
pub(crate) fn rule_form_fields(
    prefill: &RuleFormPrefill,
    accounts: &[Account],
    categories: &[Category],
) -> Markup {
    html!(
        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Description" }

            input
                name="description"
                id="description"
                type="text"
                placeholder="e.g. Rent"
                required
                autofocus
                value=(prefill.description)
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    value=[prefill.amount.map(|amount| format!("{amount:.2}"))]
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label for="kind" class=(FORM_LABEL_STYLE) { "Type" }

            select name="kind" id="kind" class=(FORM_SELECT_STYLE)
            {
                option value="expense" selected[prefill.kind == TransactionKind::Expense]
                {
                    "Expense"
                }
                option value="income" selected[prefill.kind == TransactionKind::Income]
                {
                    "Income"
                }
            }
        }

        div
        {
            label for="interval" class=(FORM_LABEL_STYLE) { "Repeats" }

            select name="interval" id="interval" class=(FORM_SELECT_STYLE)
            {
                option value="daily" selected[prefill.interval == Interval::Daily]
                {
                    "Daily"
                }
                option value="weekly" selected[prefill.interval == Interval::Weekly]
                {
                    "Weekly"
                }
                option value="monthly" selected[prefill.interval == Interval::Monthly]
                {
                    "Monthly"
                }
                option value="yearly" selected[prefill.interval == Interval::Yearly]
                {
                    "Yearly"
                }
            }
        }

        div
        {
            label for="start_date" class=(FORM_LABEL_STYLE) { "Starts" }

            input
                name="start_date"
                id="start_date"
                type="date"
                required
                value=(prefill.start_date)
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }

            select name="account_id" id="account_id" required class=(FORM_SELECT_STYLE)
            {
                @if prefill.account_id.is_none() {
                    option value="" disabled selected { "Select an account" }
                }

                @for account in accounts {
                    option
                        value=(account.id)
                        selected[prefill.account_id == Some(account.id)]
                    {
                        (account.name)
                    }
                }
            }
        }

        div
        {
            label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

            select name="category_id" id="category_id" class=(FORM_SELECT_STYLE)
            {
                option value="" selected[prefill.category_id.is_none()] { "Uncategorized" }

                @for category in categories {
                    option
                        value=(category.id)
                        selected[prefill.category_id == Some(category.id)]
                    {
                        (category.name)
                    }
                }
            }
        }
    )
}
