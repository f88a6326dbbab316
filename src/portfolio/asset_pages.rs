//! Route handlers for the create and edit asset pages.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, dollar_input_styles, loading_spinner,
    },
    navigation::NavBar,
    timezone::local_date_today,
};

use super::{
    asset_form::{AssetFormPrefill, asset_form_fields},
    core::{AssetId, get_asset},
};

/// The state needed for the create and edit asset pages.
#[derive(Debug, Clone)]
pub struct AssetPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AssetPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

fn create_asset_view(today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::PORTFOLIO_VIEW).into_html();
    let spinner = loading_spinner();
    let prefill = AssetFormPrefill::empty(today);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::POST_ASSET)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Add Asset" }

                (asset_form_fields(&prefill, today))

                div id="alert-container" {}

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Add Asset"
                }
            }
        }
    };

    base("Add Asset", &[dollar_input_styles()], &content)
}

/// Renders the page for adding an asset.
pub async fn get_create_asset_page(
    State(state): State<AssetPageState>,
) -> Result<Response, Error> {
    let today = local_date_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    Ok(create_asset_view(today).into_response())
}

/// Renders the page for editing an asset, prefilled with its current values.
pub async fn get_edit_asset_page(
    State(state): State<AssetPageState>,
    Path(asset_id): Path<AssetId>,
) -> Result<Response, Error> {
    let asset = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_asset(asset_id, &connection)
            .inspect_err(|error| tracing::error!("could not get asset {asset_id}: {error}"))?
    };

    let today = local_date_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let nav_bar = NavBar::new(endpoints::PORTFOLIO_VIEW).into_html();
    let spinner = loading_spinner();
    let prefill = AssetFormPrefill::from_asset(&asset);
    let update_url = format_endpoint(endpoints::PUT_ASSET, asset_id);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-put=(update_url)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Edit Asset" }

                (asset_form_fields(&prefill, today))

                div id="alert-container" {}

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Save"
                }
            }
        }
    };

    Ok(base("Edit Asset", &[dollar_input_styles()], &content).into_response())
}
