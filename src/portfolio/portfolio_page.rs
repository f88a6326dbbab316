//! The investment portfolio page: assets, their holdings, and totals valued
//! at each asset's latest recorded price.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        dollar_input_styles, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
};

use super::core::{Asset, AssetType, Holding, get_all_assets, get_holdings_for_asset};

/// The state needed for the portfolio page.
#[derive(Debug, Clone)]
pub struct PortfolioPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PortfolioPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// An asset with its holdings and their value at the latest price.
#[derive(Debug)]
struct AssetCard {
    asset: Asset,
    holdings: Vec<Holding>,
    value: f64,
    cost_basis: f64,
}

/// Render the portfolio page.
pub async fn get_portfolio_page(
    State(state): State<PortfolioPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let assets = get_all_assets(&connection)
        .inspect_err(|error| tracing::error!("could not get assets: {error}"))?;

    let mut cards = Vec::with_capacity(assets.len());
    for asset in assets {
        let holdings = get_holdings_for_asset(asset.id, &connection)?;
        let value = holdings
            .iter()
            .map(|holding| holding.value_at(asset.latest_price))
            .sum();
        let cost_basis = holdings.iter().map(Holding::cost_basis).sum();

        cards.push(AssetCard {
            asset,
            holdings,
            value,
            cost_basis,
        });
    }

    Ok(portfolio_view(&cards).into_response())
}

fn portfolio_view(cards: &[AssetCard]) -> Markup {
    let nav_bar = NavBar::new(endpoints::PORTFOLIO_VIEW).into_html();
    let total_value: f64 = cards.iter().map(|card| card.value).sum();
    let total_cost: f64 = cards.iter().map(|card| card.cost_basis).sum();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Portfolio" }

                    a href=(endpoints::NEW_ASSET_VIEW) class=(LINK_STYLE) { "Add Asset" }
                }

                div class="flex gap-8 text-sm text-gray-500 dark:text-gray-400"
                {
                    p
                    {
                        "Total value: "
                        span class="font-semibold text-gray-900 dark:text-white"
                        {
                            (format_currency(total_value))
                        }
                    }

                    p
                    {
                        "Total cost: "
                        span class="font-semibold text-gray-900 dark:text-white"
                        {
                            (format_currency(total_cost))
                        }
                    }

                    p
                    {
                        "Gain/loss: "
                        span class="font-semibold text-gray-900 dark:text-white"
                        {
                            (format_currency(total_value - total_cost))
                        }
                    }
                }

                div id="alert-container" {}

                @for card in cards {
                    (asset_card(card))
                }

                @if cards.is_empty() {
                    p class="text-center text-sm text-gray-500 dark:text-gray-400"
                    {
                        "No assets yet. "
                        a href=(endpoints::NEW_ASSET_VIEW) class=(LINK_STYLE)
                        {
                            "Add your first asset"
                        }
                    }
                }
            }
        }
    );

    base("Portfolio", &[dollar_input_styles()], &content)
}

fn asset_card(card: &AssetCard) -> Markup {
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_ASSET_VIEW, card.asset.id);
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_ASSET, card.asset.id);
    let confirm_message = format!(
        "Are you sure you want to delete '{}'? All of its holdings will be deleted too.",
        card.asset.ticker
    );

    let holding_row = |holding: &Holding| {
        let delete_url = endpoints::format_endpoint(endpoints::DELETE_HOLDING, holding.id);
        let value = holding.value_at(card.asset.latest_price);

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (holding.purchase_date) }
                td class="px-6 py-4 text-right" { (holding.quantity) }
                td class="px-6 py-4 text-right" { (format_currency(holding.purchase_price)) }
                td class="px-6 py-4 text-right" { (format_currency(value)) }
                td class="px-6 py-4 text-right"
                {
                    (format_currency(value - holding.cost_basis()))
                }
                td class=(TABLE_CELL_STYLE)
                {
                    button
                        type="button"
                        class="text-red-600 dark:text-red-500 hover:underline cursor-pointer"
                        hx-delete=(delete_url)
                        hx-confirm="Are you sure you want to delete this holding?"
                        hx-target="closest tr"
                        hx-swap="delete"
                    {
                        "Delete"
                    }
                }
            }
        )
    };

    html!(
        section
            class="rounded border border-gray-200 bg-white shadow-sm
                dark:border-gray-700 dark:bg-gray-800 lg:max-w-5xl lg:mx-auto lg:w-full"
            data-asset-card="true"
        {
            header class="flex justify-between flex-wrap items-center px-4 py-3"
            {
                div
                {
                    h2 class="font-bold text-gray-900 dark:text-white"
                    {
                        (card.asset.ticker)
                        span class="ml-2 font-normal text-sm text-gray-500 dark:text-gray-400"
                        {
                            (card.asset.name) " (" (type_label(card.asset.asset_type)) ")"
                        }
                    }

                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        (format_currency(card.asset.latest_price))
                        " per unit as of "
                        (card.asset.price_updated)
                    }
                }

                div class="flex items-center gap-4 text-sm"
                {
                    span class="font-semibold text-gray-900 dark:text-white"
                    {
                        (format_currency(card.value))
                    }

                    (edit_delete_action_links(
                        &edit_url,
                        &delete_url,
                        &confirm_message,
                        "closest [data-asset-card='true']",
                        "delete",
                    ))
                }
            }

            div class="w-full overflow-x-auto"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Purchased" }
                            th scope="col" class="px-6 py-3 text-right" { "Quantity" }
                            th scope="col" class="px-6 py-3 text-right" { "Price Paid" }
                            th scope="col" class="px-6 py-3 text-right" { "Value" }
                            th scope="col" class="px-6 py-3 text-right" { "Gain/Loss" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for holding in &card.holdings {
                            (holding_row(holding))
                        }

                        @if card.holdings.is_empty() {
                            tr
                            {
                                td
                                    colspan="6"
                                    class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                {
                                    "No holdings yet."
                                }
                            }
                        }
                    }
                }
            }

            form
                class="flex gap-2 items-end flex-wrap px-4 py-3"
                hx-post=(endpoints::POST_HOLDING)
                hx-target-error="#alert-container"
            {
                input type="hidden" name="asset_id" value=(card.asset.id);

                div
                {
                    label for={ "quantity-" (card.asset.id) } class=(FORM_LABEL_STYLE)
                    {
                        "Quantity"
                    }
                    input
                        type="number"
                        name="quantity"
                        id={ "quantity-" (card.asset.id) }
                        step="any"
                        min="0"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for={ "purchase_price-" (card.asset.id) } class=(FORM_LABEL_STYLE)
                    {
                        "Price Paid"
                    }
                    input
                        type="number"
                        name="purchase_price"
                        id={ "purchase_price-" (card.asset.id) }
                        step="0.01"
                        min="0"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for={ "purchase_date-" (card.asset.id) } class=(FORM_LABEL_STYLE)
                    {
                        "Purchased"
                    }
                    input
                        type="date"
                        name="purchase_date"
                        id={ "purchase_date-" (card.asset.id) }
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Holding" }
            }
        }
    )
}

fn type_label(asset_type: AssetType) -> &'static str {
    match asset_type {
        AssetType::Stock => "Stock",
        AssetType::Etf => "ETF",
        AssetType::Crypto => "Crypto",
        AssetType::Bond => "Bond",
        AssetType::Other => "Other",
    }
}
