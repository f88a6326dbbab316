//! The shared form fields for creating and editing assets.

use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::html::{FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE};

use super::core::{Asset, AssetDraft, AssetType};

/// The form data for creating or editing an asset.
#[derive(Debug, Deserialize)]
pub struct AssetForm {
    pub name: String,
    pub ticker: String,
    pub asset_type: AssetType,
    /// The latest price per unit in dollars.
    pub latest_price: f64,
    /// When the latest price was recorded.
    pub price_updated: Date,
}

impl AssetForm {
    /// Convert the form data into an [AssetDraft].
    pub fn to_draft(&self) -> AssetDraft {
        AssetDraft {
            name: self.name.clone(),
            ticker: self.ticker.trim().to_uppercase(),
            asset_type: self.asset_type,
            latest_price: self.latest_price,
            price_updated: self.price_updated,
        }
    }
}

/// The values to prefill the asset form with.
pub(crate) struct AssetFormPrefill {
    pub name: String,
    pub ticker: String,
    pub asset_type: AssetType,
    pub latest_price: Option<f64>,
    pub price_updated: Date,
}

impl AssetFormPrefill {
    /// An empty form with the price dated today.
    pub fn empty(today: Date) -> Self {
        Self {
            name: String::new(),
            ticker: String::new(),
            asset_type: AssetType::Stock,
            latest_price: None,
            price_updated: today,
        }
    }

    /// Prefill from an existing asset.
    pub fn from_asset(asset: &Asset) -> Self {
        Self {
            name: asset.name.clone(),
            ticker: asset.ticker.clone(),
            asset_type: asset.asset_type,
            latest_price: Some(asset.latest_price),
            price_updated: asset.price_updated,
        }
    }
}

/// Render the form fields shared by the create and edit asset pages.
pub(crate) fn asset_form_fields(prefill: &AssetFormPrefill, max_date: Date) -> Markup {
    let type_option = |value: AssetType, label: &str| {
        html!(
            option value=(value.as_str()) selected[prefill.asset_type == value] { (label) }
        )
    };

    html!(
        div
        {
            label for="ticker" class=(FORM_LABEL_STYLE) { "Ticker" }

            input
                name="ticker"
                id="ticker"
                type="text"
                placeholder="e.g. VOO"
                required
                autofocus
                value=(prefill.ticker)
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="name" class=(FORM_LABEL_STYLE) { "Name" }

            input
                name="name"
                id="name"
                type="text"
                placeholder="e.g. Vanguard S&P 500 ETF"
                required
                value=(prefill.name)
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="asset_type" class=(FORM_LABEL_STYLE) { "Type" }

            select name="asset_type" id="asset_type" class=(FORM_SELECT_STYLE)
            {
                (type_option(AssetType::Stock, "Stock"))
                (type_option(AssetType::Etf, "ETF"))
                (type_option(AssetType::Crypto, "Crypto"))
                (type_option(AssetType::Bond, "Bond"))
                (type_option(AssetType::Other, "Other"))
            }
        }

        div
        {
            label for="latest_price" class=(FORM_LABEL_STYLE) { "Latest Price" }

            div class="input-wrapper w-full"
            {
                input
                    name="latest_price"
                    id="latest_price"
                    type="number"
                    step="0.01"
                    min="0"
                    placeholder="0.00"
                    value=[prefill.latest_price.map(|price| format!("{price:.2}"))]
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label for="price_updated" class=(FORM_LABEL_STYLE) { "Price Date" }

            input
                name="price_updated"
                id="price_updated"
                type="date"
                max=(max_date)
                required
                value=(prefill.price_updated)
                class=(FORM_TEXT_INPUT_STYLE);
        }
    )
}
