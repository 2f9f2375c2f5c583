use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::trace;
use sqlx::SqliteConnection;

use crate::traits::{LocationBookingCount, LocationPrice, OccupiedLocation, RevenueRow, SpotOverview, SpotUsage};

/// Locations (by address and floor) with no available spot left. Folded into one row per address with
/// the list of fully-occupied floors; flat locations report an empty floor list.
pub async fn occupied_locations(conn: &mut SqliteConnection) -> Result<Vec<OccupiedLocation>, sqlx::Error> {
    let rows: Vec<(String, Option<String>)> = sqlx::query_as(
        r#"
            SELECT pl.address, ps.floor
            FROM parking_locations pl
            LEFT JOIN parking_spots ps ON pl.id = ps.location_id
            GROUP BY pl.address, ps.floor
            HAVING SUM(CASE WHEN ps.is_available = 1 THEN 1 ELSE 0 END) = 0
        "#,
    )
    .fetch_all(conn)
    .await?;
    let mut by_address: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (address, floor) in rows {
        let floors = by_address.entry(address).or_default();
        if let Some(floor) = floor {
            floors.push(floor);
        }
    }
    Ok(by_address.into_iter().map(|(address, floors)| OccupiedLocation { address, floors }).collect())
}

pub async fn spots_for_address(
    address: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<SpotOverview>, sqlx::Error> {
    let spots = sqlx::query_as(
        r#"
            SELECT ps.spot_number, ps.floor, ps.is_available, ps.price
            FROM parking_spots ps
            JOIN parking_locations pl ON pl.id = ps.location_id
            WHERE pl.address = $1
            ORDER BY ps.floor, ps.spot_number
        "#,
    )
    .bind(address)
    .fetch_all(conn)
    .await?;
    Ok(spots)
}

/// Average hourly price per location. Prices are stored in cents; the projection reports whole currency
/// units because that is what the booking front end displays and the invoice calculation consumes.
pub async fn location_prices(conn: &mut SqliteConnection) -> Result<Vec<LocationPrice>, sqlx::Error> {
    let rows: Vec<(String, Option<f64>)> = sqlx::query_as(
        r#"
            SELECT pl.address, AVG(ps.price)
            FROM parking_locations pl
            JOIN parking_spots ps ON pl.id = ps.location_id
            GROUP BY pl.address
        "#,
    )
    .fetch_all(conn)
    .await?;
    let prices = rows
        .into_iter()
        .map(|(address, avg_cents)| {
            let price_per_hour = avg_cents.unwrap_or(0.0) / 100.0;
            LocationPrice { address, price_per_hour, price_per_minute: price_per_hour / 60.0 }
        })
        .collect();
    Ok(prices)
}

pub async fn bookings_per_location(
    since: NaiveDate,
    until: NaiveDate,
    conn: &mut SqliteConnection,
) -> Result<Vec<LocationBookingCount>, sqlx::Error> {
    let rows: Vec<LocationBookingCount> = sqlx::query_as(
        r#"
            SELECT pl.address AS address, COUNT(b.id) AS booking_count
            FROM parking_locations pl
            JOIN parking_spots ps ON pl.id = ps.location_id
            JOIN bookings b ON ps.id = b.spot_id
            WHERE substr(b.start_time, 1, 10) BETWEEN $1 AND $2
            GROUP BY pl.address
            ORDER BY COUNT(b.id) DESC
        "#,
    )
    .bind(since.to_string())
    .bind(until.to_string())
    .fetch_all(conn)
    .await?;
    trace!("📊️ bookings_per_location returned {} rows", rows.len());
    Ok(rows)
}

/// The five spots with the longest average booking duration in the range. SQLite accepts both stored
/// time formats directly, so `julianday` does the duration arithmetic.
pub async fn busiest_spots(
    since: NaiveDate,
    until: NaiveDate,
    conn: &mut SqliteConnection,
) -> Result<Vec<SpotUsage>, sqlx::Error> {
    let rows = sqlx::query_as(
        r#"
            SELECT
                ps.id AS spot_id,
                ps.spot_number AS spot_number,
                pl.address AS address,
                ps.floor AS floor,
                AVG((julianday(b.end_time) - julianday(b.start_time)) * 24.0) AS avg_hours
            FROM parking_spots ps
            JOIN bookings b ON ps.id = b.spot_id
            JOIN parking_locations pl ON ps.location_id = pl.id
            WHERE substr(b.start_time, 1, 10) BETWEEN $1 AND $2
            GROUP BY ps.id, ps.spot_number, pl.address, ps.floor
            ORDER BY avg_hours DESC
            LIMIT 5
        "#,
    )
    .bind(since.to_string())
    .bind(until.to_string())
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Revenue per (location, calendar day): booked hours × the spot's hourly price, summed and rounded to
/// whole cents.
pub async fn revenue_by_location_and_day(
    since: NaiveDate,
    until: NaiveDate,
    conn: &mut SqliteConnection,
) -> Result<Vec<RevenueRow>, sqlx::Error> {
    let rows = sqlx::query_as(
        r#"
            SELECT
                pl.address AS address,
                substr(b.start_time, 1, 10) AS date,
                CAST(ROUND(SUM((julianday(b.end_time) - julianday(b.start_time)) * 24.0 * ps.price)) AS INTEGER)
                    AS revenue
            FROM bookings b
            JOIN parking_spots ps ON b.spot_id = ps.id
            JOIN parking_locations pl ON ps.location_id = pl.id
            WHERE substr(b.start_time, 1, 10) BETWEEN $1 AND $2
            GROUP BY pl.address, substr(b.start_time, 1, 10)
            ORDER BY substr(b.start_time, 1, 10), pl.address
        "#,
    )
    .bind(since.to_string())
    .bind(until.to_string())
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
