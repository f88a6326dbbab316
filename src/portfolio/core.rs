//! Data model and database queries for investment assets and holdings.
//!
//! Prices are recorded manually on the asset; holdings are valued at the
//! latest recorded price.

use rusqlite::{Connection, Row, types::FromSqlError};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::Error;

/// Database identifier for an asset.
pub type AssetId = i64;

/// Database identifier for a holding.
pub type HoldingId = i64;

/// The broad class an asset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Stock,
    Etf,
    Crypto,
    Bond,
    Other,
}

impl AssetType {
    /// The string stored in the database for this asset type.
    pub fn as_str(self) -> &'static str {
        match self {
            AssetType::Stock => "stock",
            AssetType::Etf => "etf",
            AssetType::Crypto => "crypto",
            AssetType::Bond => "bond",
            AssetType::Other => "other",
        }
    }

    /// Parse the database string for an asset type.
    pub fn from_db_string(asset_type: &str) -> Result<Self, FromSqlError> {
        match asset_type {
            "stock" => Ok(AssetType::Stock),
            "etf" => Ok(AssetType::Etf),
            "crypto" => Ok(AssetType::Crypto),
            "bond" => Ok(AssetType::Bond),
            "other" => Ok(AssetType::Other),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// A tradeable instrument with a manually recorded latest price.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub id: AssetId,
    /// A human-readable name, e.g. "Vanguard S&P 500 ETF".
    pub name: String,
    /// The exchange ticker symbol, unique per asset.
    pub ticker: String,
    pub asset_type: AssetType,
    /// The most recently recorded price per unit.
    pub latest_price: f64,
    /// When the latest price was recorded.
    pub price_updated: Date,
}

/// A quantity of an asset bought on a particular date.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub id: HoldingId,
    pub asset_id: AssetId,
    pub quantity: f64,
    /// The price per unit paid at purchase.
    pub purchase_price: f64,
    pub purchase_date: Date,
}

impl Holding {
    /// The value of this holding at the given price per unit.
    pub fn value_at(&self, price: f64) -> f64 {
        self.quantity * price
    }

    /// What was paid for this holding.
    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.purchase_price
    }
}

/// The fields needed to create or update an asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDraft {
    pub name: String,
    pub ticker: String,
    pub asset_type: AssetType,
    pub latest_price: f64,
    pub price_updated: Date,
}

impl AssetDraft {
    fn validate(&self) -> Result<(), Error> {
        if !self.latest_price.is_finite() || self.latest_price < 0.0 {
            return Err(Error::InvalidAmount(self.latest_price));
        }

        Ok(())
    }
}

/// Create the asset and holding tables in the database.
///
/// Deleting an asset deletes its holdings.
pub fn create_portfolio_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS asset (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                ticker TEXT NOT NULL UNIQUE COLLATE NOCASE,
                asset_type TEXT NOT NULL,
                latest_price REAL NOT NULL,
                price_updated TEXT NOT NULL
                );
        CREATE TABLE IF NOT EXISTS holding (
                id INTEGER PRIMARY KEY,
                asset_id INTEGER NOT NULL REFERENCES asset(id) ON DELETE CASCADE,
                quantity REAL NOT NULL,
                purchase_price REAL NOT NULL,
                purchase_date TEXT NOT NULL
                );",
    )?;

    Ok(())
}

/// Create an asset.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the price is negative or not finite,
/// - or [Error::DuplicateTicker] if an asset with the ticker already exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_asset(draft: AssetDraft, connection: &Connection) -> Result<Asset, Error> {
    draft.validate()?;

    connection
        .prepare(
            "INSERT INTO asset (name, ticker, asset_type, latest_price, price_updated)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, name, ticker, asset_type, latest_price, price_updated",
        )?
        .query_row(
            (
                &draft.name,
                &draft.ticker,
                draft.asset_type.as_str(),
                draft.latest_price,
                draft.price_updated,
            ),
            map_asset_row,
        )
        .map_err(|error| map_ticker_error(error, &draft.ticker))
}

/// Update an asset's details and latest price.
pub fn update_asset(
    id: AssetId,
    draft: AssetDraft,
    connection: &Connection,
) -> Result<Asset, Error> {
    draft.validate()?;

    connection
        .prepare(
            "UPDATE asset
             SET name = ?1, ticker = ?2, asset_type = ?3, latest_price = ?4, price_updated = ?5
             WHERE id = ?6
             RETURNING id, name, ticker, asset_type, latest_price, price_updated",
        )?
        .query_row(
            (
                &draft.name,
                &draft.ticker,
                draft.asset_type.as_str(),
                draft.latest_price,
                draft.price_updated,
                id,
            ),
            map_asset_row,
        )
        .map_err(|error| match map_ticker_error(error, &draft.ticker) {
            Error::NotFound => Error::UpdateMissingAsset,
            error => error,
        })
}

/// Delete an asset and all of its holdings.
pub fn delete_asset(id: AssetId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM asset WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingAsset);
    }

    Ok(())
}

/// Retrieve an asset from the database by its `id`.
pub fn get_asset(id: AssetId, connection: &Connection) -> Result<Asset, Error> {
    let asset = connection
        .prepare(
            "SELECT id, name, ticker, asset_type, latest_price, price_updated
            FROM asset WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_asset_row)?;

    Ok(asset)
}

/// Retrieve all assets ordered by ticker.
pub fn get_all_assets(connection: &Connection) -> Result<Vec<Asset>, Error> {
    connection
        .prepare(
            "SELECT id, name, ticker, asset_type, latest_price, price_updated
            FROM asset
            ORDER BY ticker ASC",
        )?
        .query_map([], map_asset_row)?
        .map(|maybe_asset| maybe_asset.map_err(Error::from))
        .collect()
}

/// Create a holding of an asset.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the quantity or purchase price is not a
///   positive finite number,
/// - or [Error::NotFound] if the asset does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_holding(
    asset_id: AssetId,
    quantity: f64,
    purchase_price: f64,
    purchase_date: Date,
    connection: &Connection,
) -> Result<Holding, Error> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(Error::InvalidAmount(quantity));
    }

    if !purchase_price.is_finite() || purchase_price < 0.0 {
        return Err(Error::InvalidAmount(purchase_price));
    }

    connection
        .prepare(
            "INSERT INTO holding (asset_id, quantity, purchase_price, purchase_date)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, asset_id, quantity, purchase_price, purchase_date",
        )?
        .query_row(
            (asset_id, quantity, purchase_price, purchase_date),
            map_holding_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::NotFound,
            error => error.into(),
        })
}

/// Delete a holding by ID.
pub fn delete_holding(id: HoldingId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM holding WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingHolding);
    }

    Ok(())
}

/// Retrieve all holdings of an asset, oldest purchase first.
pub fn get_holdings_for_asset(
    asset_id: AssetId,
    connection: &Connection,
) -> Result<Vec<Holding>, Error> {
    connection
        .prepare(
            "SELECT id, asset_id, quantity, purchase_price, purchase_date
            FROM holding
            WHERE asset_id = ?1
            ORDER BY purchase_date ASC, id ASC",
        )?
        .query_map([asset_id], map_holding_row)?
        .map(|maybe_holding| maybe_holding.map_err(Error::from))
        .collect()
}

fn map_asset_row(row: &Row) -> Result<Asset, rusqlite::Error> {
    let asset_type: String = row.get(3)?;

    Ok(Asset {
        id: row.get(0)?,
        name: row.get(1)?,
        ticker: row.get(2)?,
        asset_type: AssetType::from_db_string(&asset_type)?,
        latest_price: row.get(4)?,
        price_updated: row.get(5)?,
    })
}

fn map_holding_row(row: &Row) -> Result<Holding, rusqlite::Error> {
    Ok(Holding {
        id: row.get(0)?,
        asset_id: row.get(1)?,
        quantity: row.get(2)?,
        purchase_price: row.get(3)?,
        purchase_date: row.get(4)?,
    })
}

fn map_ticker_error(error: rusqlite::Error, ticker: &str) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        ) => Error::DuplicateTicker(ticker.to_owned()),
        error => error.into(),
    }
}

#[cfg(test)]
mod portfolio_query_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{Error, db::initialize};

    use super::{
        AssetDraft, AssetType, create_asset, create_holding, delete_asset, delete_holding,
        get_all_assets, get_asset, get_holdings_for_asset, update_asset,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn voo_draft() -> AssetDraft {
        AssetDraft {
            name: "Vanguard S&P 500 ETF".to_owned(),
            ticker: "VOO".to_owned(),
            asset_type: AssetType::Etf,
            latest_price: 550.0,
            price_updated: date!(2025 - 06 - 01),
        }
    }

    #[test]
    fn can_create_and_get_asset() {
        let connection = get_test_connection();

        let asset = create_asset(voo_draft(), &connection).unwrap();

        assert_eq!(get_asset(asset.id, &connection).unwrap(), asset);
    }

    #[test]
    fn duplicate_ticker_is_rejected_case_insensitively() {
        let connection = get_test_connection();
        create_asset(voo_draft(), &connection).unwrap();

        let result = create_asset(
            AssetDraft {
                ticker: "voo".to_owned(),
                ..voo_draft()
            },
            &connection,
        );

        assert!(matches!(result, Err(Error::DuplicateTicker(_))));
    }

    #[test]
    fn negative_price_is_rejected() {
        let connection = get_test_connection();

        let result = create_asset(
            AssetDraft {
                latest_price: -1.0,
                ..voo_draft()
            },
            &connection,
        );

        assert!(matches!(result, Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn update_changes_price_and_date() {
        let connection = get_test_connection();
        let asset = create_asset(voo_draft(), &connection).unwrap();

        let updated = update_asset(
            asset.id,
            AssetDraft {
                latest_price: 560.0,
                price_updated: date!(2025 - 06 - 15),
                ..voo_draft()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.latest_price, 560.0);
        assert_eq!(updated.price_updated, date!(2025 - 06 - 15));
    }

    #[test]
    fn update_missing_asset_is_an_error() {
        let connection = get_test_connection();

        let result = update_asset(999, voo_draft(), &connection);

        assert!(matches!(result, Err(Error::UpdateMissingAsset)));
    }

    #[test]
    fn deleting_asset_deletes_its_holdings() {
        let connection = get_test_connection();
        let asset = create_asset(voo_draft(), &connection).unwrap();
        create_holding(asset.id, 2.0, 500.0, date!(2025 - 01 - 15), &connection).unwrap();

        delete_asset(asset.id, &connection).unwrap();

        let holding_count: i64 = connection
            .query_row("SELECT COUNT(1) FROM holding", (), |row| row.get(0))
            .unwrap();
        assert_eq!(holding_count, 0);
        assert!(get_all_assets(&connection).unwrap().is_empty());
    }

    #[test]
    fn holding_for_missing_asset_is_not_found() {
        let connection = get_test_connection();

        let result = create_holding(999, 2.0, 500.0, date!(2025 - 01 - 15), &connection);

        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let connection = get_test_connection();
        let asset = create_asset(voo_draft(), &connection).unwrap();

        let result = create_holding(asset.id, 0.0, 500.0, date!(2025 - 01 - 15), &connection);

        assert!(matches!(result, Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn can_delete_holding() {
        let connection = get_test_connection();
        let asset = create_asset(voo_draft(), &connection).unwrap();
        let holding =
            create_holding(asset.id, 2.0, 500.0, date!(2025 - 01 - 15), &connection).unwrap();

        delete_holding(holding.id, &connection).unwrap();

        assert!(get_holdings_for_asset(asset.id, &connection)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn delete_missing_holding_is_an_error() {
        let connection = get_test_connection();

        assert!(matches!(
            delete_holding(999, &connection),
            Err(Error::DeleteMissingHolding)
        ));
    }
}
