//! Alert fragments for displaying success and error messages to users.
//!
//! Alerts are rendered into the `#alert-container` element by HTMX using the
//! response-targets extension.

use maud::{Markup, html};

/// The result of an operation, rendered as a dismissable banner.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// The operation succeeded.
    Success {
        /// A short headline, e.g. "Import completed".
        message: String,
        /// Supporting detail shown below the headline.
        details: String,
    },
    /// The operation failed.
    Error {
        /// A short headline, e.g. "Could not delete account".
        message: String,
        /// Supporting detail shown below the headline.
        details: String,
    },
}

impl Alert {
    /// Render the alert as markup.
    pub fn into_markup(self) -> Markup {
        match self {
            Alert::Success { message, details } => {
                AlertView::new(&message, &details, SUCCESS_STYLE).into_markup()
            }
            Alert::Error { message, details } => {
                AlertView::new(&message, &details, ERROR_STYLE).into_markup()
            }
        }
    }
}

const SUCCESS_STYLE: &str = "mb-4 rounded border border-green-300 bg-green-50 \
    p-4 text-sm text-green-800 dark:border-green-800 dark:bg-gray-800 \
    dark:text-green-400";

const ERROR_STYLE: &str = "mb-4 rounded border border-red-300 bg-red-50 \
    p-4 text-sm text-red-800 dark:border-red-800 dark:bg-gray-800 \
    dark:text-red-400";

/// Renders alert messages with appropriate styling.
pub struct AlertView<'a> {
    message: &'a str,
    details: &'a str,
    style: &'static str,
}

impl<'a> AlertView<'a> {
    fn new(message: &'a str, details: &'a str, style: &'static str) -> Self {
        Self {
            message,
            details,
            style,
        }
    }

    /// Create a new success alert.
    pub fn success(message: &'a str, details: &'a str) -> Markup {
        Self::new(message, details, SUCCESS_STYLE).into_markup()
    }

    /// Create a new error alert.
    pub fn error(message: &'a str, details: &'a str) -> Markup {
        Self::new(message, details, ERROR_STYLE).into_markup()
    }

    fn into_markup(self) -> Markup {
        html! {
            div class=(self.style) role="alert"
            {
                p class="font-medium" { (self.message) }

                @if !self.details.is_empty() {
                    p class="mt-1" { (self.details) }
                }
            }
        }
    }
}
