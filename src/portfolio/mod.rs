//! Investment assets and holdings, valued at manually recorded prices.

mod asset_endpoints;
mod asset_form;
mod asset_pages;
mod core;
mod holding_endpoints;
mod portfolio_page;

pub use asset_endpoints::{create_asset_endpoint, delete_asset_endpoint, update_asset_endpoint};
pub use asset_form::AssetForm;
pub use asset_pages::{get_create_asset_page, get_edit_asset_page};
pub use core::{
    Asset, AssetDraft, AssetId, AssetType, Holding, HoldingId, create_asset, create_holding,
    create_portfolio_tables, delete_asset, delete_holding, get_all_assets, get_asset,
    get_holdings_for_asset, update_asset,
};
pub use holding_endpoints::{HoldingForm, create_holding_endpoint, delete_holding_endpoint};
pub use portfolio_page::get_portfolio_page;
