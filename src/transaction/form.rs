//! The shared form fields for creating and editing transactions.

use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    account::{Account, AccountId},
    category::{Category, CategoryId},
    html::{FORM_CHECKBOX_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE},
    transaction::{Transaction, TransactionBuilder, TransactionKind},
};

/// The form data for creating or editing a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// The value of the transaction in dollars. Always positive.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// The date when the transaction occurred.
    pub date: Date,
    /// Text detailing the transaction.
    pub description: String,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
    /// Present when the 'affects balance' checkbox is ticked.
    #[serde(default)]
    pub affects_balance: Option<String>,
    /// The account the transaction belongs to.
    pub account_id: AccountId,
    /// The category of the transaction, if any.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// A comma separated list of tags.
    #[serde(default)]
    pub tags: String,
}

impl TransactionForm {
    /// Convert the form data into a [TransactionBuilder].
    pub fn to_builder(&self) -> TransactionBuilder {
        Transaction::build(
            self.amount,
            self.kind,
            self.date,
            &self.description,
            self.account_id,
        )
        .notes(&self.notes)
        .affects_balance(self.affects_balance.is_some())
        .category_id(self.category_id)
    }
}

/// The values to prefill the transaction form with.
pub(crate) struct TransactionFormPrefill {
    pub amount: Option<f64>,
    pub kind: TransactionKind,
    pub date: Date,
    pub description: String,
    pub notes: String,
    pub affects_balance: bool,
    pub account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    pub tags: String,
}

impl TransactionFormPrefill {
    /// An empty form defaulting to an expense dated today.
    pub fn empty(today: Date) -> Self {
        Self {
            amount: None,
            kind: TransactionKind::Expense,
            date: today,
            description: String::new(),
            notes: String::new(),
            affects_balance: true,
            account_id: None,
            category_id: None,
            tags: String::new(),
        }
    }

    /// Prefill from an existing transaction and its tags.
    pub fn from_transaction(transaction: &Transaction, tags: &str) -> Self {
        Self {
            amount: Some(transaction.amount),
            kind: transaction.kind,
            date: transaction.date,
            description: transaction.description.clone(),
            notes: transaction.notes.clone(),
            affects_balance: transaction.affects_balance,
            account_id: Some(transaction.account_id),
            category_id: transaction.category_id,
            tags: tags.to_owned(),
        }
    }
}

/// Render the form fields shared by the create and edit transaction pages.
pub(crate) fn transaction_form_fields(
    prefill: &TransactionFormPrefill,
    max_date: Date,
    accounts: &[Account],
    categories: &[Category],
) -> Markup {
    html!(
        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            // w-full needed to ensure input takes the full width when prefilled with a value
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
                    autofocus
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
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                name="date"
                id="date"
                type="date"
                max=(max_date)
                required
                value=(prefill.date)
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Description" }

            input
                name="description"
                id="description"
                type="text"
                placeholder="Description"
                required
                value=(prefill.description)
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

        div
        {
            label for="tags" class=(FORM_LABEL_STYLE) { "Tags" }

            input
                name="tags"
                id="tags"
                type="text"
                placeholder="e.g. holiday, work"
                value=(prefill.tags)
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="notes" class=(FORM_LABEL_STYLE) { "Notes" }

            textarea
                name="notes"
                id="notes"
                rows="3"
                class=(FORM_TEXT_INPUT_STYLE)
            {
                (prefill.notes)
            }
        }

        div class="flex items-center gap-2"
        {
            input
                name="affects_balance"
                id="affects_balance"
                type="checkbox"
                checked[prefill.affects_balance]
                class=(FORM_CHECKBOX_STYLE);

            label for="affects_balance" class=(FORM_LABEL_STYLE) { "Affects account balance" }
        }
    )
}
