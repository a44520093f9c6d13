//! SQL data access for sales, returns, and targets.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use fieldops_core::clock::{DATE_FORMAT, TIMESTAMP_FORMAT};
use fieldops_core::{generate_id, ids};

use crate::errors::{Result, SalesError};
use crate::types::{ReturnRecord, Sale, Target, TradeFilter};

/// Get current UTC timestamp as ISO 8601 string.
fn now_iso() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

fn date_to_sql(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn date_from_sql(idx: usize, value: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// First day of the month and the exclusive first day of the next one.
fn month_range(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| SalesError::Validation(format!("invalid month: {year}-{month}")))?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| SalesError::Validation(format!("invalid month: {year}-{month}")))?;
    Ok((start, end))
}

const TRADE_COLUMNS: &str = "id, representative_id, date, product_group, brand, product_name, \
     quantity, unit_price, total_price, net_price, customer_name, customer_code, created_at";

fn sale_from_row(row: &Row<'_>) -> rusqlite::Result<Sale> {
    Ok(Sale {
        id: row.get(0)?,
        representative_id: row.get(1)?,
        date: date_from_sql(2, row.get(2)?)?,
        product_group: row.get(3)?,
        brand: row.get(4)?,
        product_name: row.get(5)?,
        quantity: row.get(6)?,
        unit_price: row.get(7)?,
        total_price: row.get(8)?,
        net_price: row.get(9)?,
        customer_name: row.get(10)?,
        customer_code: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn return_from_row(row: &Row<'_>) -> rusqlite::Result<ReturnRecord> {
    Ok(ReturnRecord {
        id: row.get(0)?,
        representative_id: row.get(1)?,
        date: date_from_sql(2, row.get(2)?)?,
        product_group: row.get(3)?,
        brand: row.get(4)?,
        product_name: row.get(5)?,
        quantity: row.get(6)?,
        unit_price: row.get(7)?,
        total_price: row.get(8)?,
        net_price: row.get(9)?,
        return_reason: row.get(10)?,
        customer_name: row.get(11)?,
        customer_code: row.get(12)?,
        created_at: row.get(13)?,
    })
}

fn target_from_row(row: &Row<'_>) -> rusqlite::Result<Target> {
    Ok(Target {
        id: row.get(0)?,
        user_id: row.get(1)?,
        year: row.get(2)?,
        month: row.get(3)?,
        target_amount: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn push_filter(
    filter: &TradeFilter,
    conditions: &mut Vec<String>,
    values: &mut Vec<Box<dyn rusqlite::types::ToSql>>,
) {
    if let Some(ref ids) = filter.representative_ids {
        if ids.is_empty() {
            // Empty scope matches nothing.
            conditions.push("1 = 0".to_string());
        } else {
            let placeholders = vec!["?"; ids.len()].join(", ");
            conditions.push(format!("representative_id IN ({placeholders})"));
            for id in ids {
                values.push(Box::new(id.clone()));
            }
        }
    }
    if let Some(start) = filter.start_date {
        conditions.push("date >= ?".to_string());
        values.push(Box::new(date_to_sql(start)));
    }
    if let Some(end) = filter.end_date {
        conditions.push("date <= ?".to_string());
        values.push(Box::new(date_to_sql(end)));
    }
}

fn where_clause(conditions: &[String]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

/// Repository for the sale and return ledgers.
pub struct TradeRepository;

impl TradeRepository {
    /// Insert a sale row.
    #[allow(clippy::too_many_arguments)]
    pub fn create_sale(
        conn: &Connection,
        representative_id: &str,
        date: NaiveDate,
        product_group: &str,
        brand: &str,
        product_name: &str,
        quantity: i64,
        unit_price: f64,
        total_price: f64,
        net_price: f64,
        customer_name: Option<&str>,
        customer_code: Option<&str>,
    ) -> Result<Sale> {
        let id = generate_id(ids::SALE);
        let _ = conn.execute(
            "INSERT INTO sales (id, representative_id, date, product_group, brand, product_name,
             quantity, unit_price, total_price, net_price, customer_name, customer_code, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                id,
                representative_id,
                date_to_sql(date),
                product_group,
                brand,
                product_name,
                quantity,
                unit_price,
                total_price,
                net_price,
                customer_name,
                customer_code,
                now_iso(),
            ],
        )?;
        let sale = conn.query_row(
            &format!("SELECT {TRADE_COLUMNS} FROM sales WHERE id = ?1"),
            params![id],
            sale_from_row,
        )?;
        Ok(sale)
    }

    /// Insert a return row.
    #[allow(clippy::too_many_arguments)]
    pub fn create_return(
        conn: &Connection,
        representative_id: &str,
        date: NaiveDate,
        product_group: &str,
        brand: &str,
        product_name: &str,
        quantity: i64,
        unit_price: f64,
        total_price: f64,
        net_price: f64,
        return_reason: Option<&str>,
        customer_name: Option<&str>,
        customer_code: Option<&str>,
    ) -> Result<ReturnRecord> {
        let id = generate_id(ids::RETURN);
        let _ = conn.execute(
            "INSERT INTO returns (id, representative_id, date, product_group, brand, product_name,
             quantity, unit_price, total_price, net_price, return_reason, customer_name,
             customer_code, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                id,
                representative_id,
                date_to_sql(date),
                product_group,
                brand,
                product_name,
                quantity,
                unit_price,
                total_price,
                net_price,
                return_reason,
                customer_name,
                customer_code,
                now_iso(),
            ],
        )?;
        let record = conn.query_row(
            "SELECT id, representative_id, date, product_group, brand, product_name, quantity,
             unit_price, total_price, net_price, return_reason, customer_name, customer_code,
             created_at FROM returns WHERE id = ?1",
            params![id],
            return_from_row,
        )?;
        Ok(record)
    }

    /// List sales matching the filter, newest date first.
    pub fn list_sales(conn: &Connection, filter: &TradeFilter) -> Result<Vec<Sale>> {
        let mut conditions = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        push_filter(filter, &mut conditions, &mut values);

        let sql = format!(
            "SELECT {TRADE_COLUMNS} FROM sales {} ORDER BY date DESC, id DESC",
            where_clause(&conditions)
        );
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(AsRef::as_ref).collect();
        let mut stmt = conn.prepare(&sql)?;
        let sales = stmt
            .query_map(params_refs.as_slice(), sale_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sales)
    }

    /// List returns matching the filter, newest date first.
    pub fn list_returns(conn: &Connection, filter: &TradeFilter) -> Result<Vec<ReturnRecord>> {
        let mut conditions = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        push_filter(filter, &mut conditions, &mut values);

        let sql = format!(
            "SELECT id, representative_id, date, product_group, brand, product_name, quantity,
             unit_price, total_price, net_price, return_reason, customer_name, customer_code,
             created_at FROM returns {} ORDER BY date DESC, id DESC",
            where_clause(&conditions)
        );
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(AsRef::as_ref).collect();
        let mut stmt = conn.prepare(&sql)?;
        let returns = stmt
            .query_map(params_refs.as_slice(), return_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(returns)
    }

    /// Most recently recorded sales (insertion order, not trade date).
    pub fn recent_sales(conn: &Connection, filter: &TradeFilter, limit: u32) -> Result<Vec<Sale>> {
        let mut conditions = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        push_filter(filter, &mut conditions, &mut values);
        values.push(Box::new(limit));

        let sql = format!(
            "SELECT {TRADE_COLUMNS} FROM sales {} ORDER BY created_at DESC, id DESC LIMIT ?",
            where_clause(&conditions)
        );
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(AsRef::as_ref).collect();
        let mut stmt = conn.prepare(&sql)?;
        let sales = stmt
            .query_map(params_refs.as_slice(), sale_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sales)
    }

    /// Most recently recorded returns.
    pub fn recent_returns(
        conn: &Connection,
        filter: &TradeFilter,
        limit: u32,
    ) -> Result<Vec<ReturnRecord>> {
        let mut conditions = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        push_filter(filter, &mut conditions, &mut values);
        values.push(Box::new(limit));

        let sql = format!(
            "SELECT id, representative_id, date, product_group, brand, product_name, quantity,
             unit_price, total_price, net_price, return_reason, customer_name, customer_code,
             created_at FROM returns {} ORDER BY created_at DESC, id DESC LIMIT ?",
            where_clause(&conditions)
        );
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(AsRef::as_ref).collect();
        let mut stmt = conn.prepare(&sql)?;
        let returns = stmt
            .query_map(params_refs.as_slice(), return_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(returns)
    }

    /// Net sales total matching the filter.
    pub fn sum_net_sales(conn: &Connection, filter: &TradeFilter) -> Result<f64> {
        Self::sum_net(conn, "sales", filter)
    }

    /// Net returns total matching the filter.
    pub fn sum_net_returns(conn: &Connection, filter: &TradeFilter) -> Result<f64> {
        Self::sum_net(conn, "returns", filter)
    }

    /// Net sales total for one representative and month.
    pub fn month_net_sales(
        conn: &Connection,
        representative_id: &str,
        year: i32,
        month: u32,
    ) -> Result<f64> {
        let (start, end) = month_range(year, month)?;
        let total = conn.query_row(
            "SELECT COALESCE(SUM(net_price), 0) FROM sales
             WHERE representative_id = ?1 AND date >= ?2 AND date < ?3",
            params![representative_id, date_to_sql(start), date_to_sql(end)],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Net returns total for one representative and month.
    pub fn month_net_returns(
        conn: &Connection,
        representative_id: &str,
        year: i32,
        month: u32,
    ) -> Result<f64> {
        let (start, end) = month_range(year, month)?;
        let total = conn.query_row(
            "SELECT COALESCE(SUM(net_price), 0) FROM returns
             WHERE representative_id = ?1 AND date >= ?2 AND date < ?3",
            params![representative_id, date_to_sql(start), date_to_sql(end)],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    fn sum_net(conn: &Connection, table: &str, filter: &TradeFilter) -> Result<f64> {
        let mut conditions = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        push_filter(filter, &mut conditions, &mut values);

        let sql = format!(
            "SELECT COALESCE(SUM(net_price), 0) FROM {table} {}",
            where_clause(&conditions)
        );
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(AsRef::as_ref).collect();
        let total = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
        Ok(total)
    }
}

/// Repository for monthly targets.
pub struct TargetRepository;

impl TargetRepository {
    /// Insert a target; a duplicate (user, year, month) is a conflict.
    pub fn create(
        conn: &Connection,
        user_id: &str,
        year: i32,
        month: u32,
        target_amount: f64,
    ) -> Result<Target> {
        if Self::get_for_month(conn, user_id, year, month)?.is_some() {
            return Err(SalesError::DuplicateTarget);
        }
        let id = generate_id(ids::TARGET);
        let now = now_iso();
        let _ = conn.execute(
            "INSERT INTO targets (id, user_id, year, month, target_amount, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![id, user_id, year, month, target_amount, now],
        )?;
        Self::get(conn, &id)?.ok_or_else(|| SalesError::NotFound("target".to_string()))
    }

    /// Get a target by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<Target>> {
        let target = conn
            .query_row(
                "SELECT id, user_id, year, month, target_amount, created_at, updated_at
                 FROM targets WHERE id = ?1",
                params![id],
                target_from_row,
            )
            .optional()?;
        Ok(target)
    }

    /// The target for a (user, year, month), if set.
    pub fn get_for_month(
        conn: &Connection,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Option<Target>> {
        let target = conn
            .query_row(
                "SELECT id, user_id, year, month, target_amount, created_at, updated_at
                 FROM targets WHERE user_id = ?1 AND year = ?2 AND month = ?3",
                params![user_id, year, month],
                target_from_row,
            )
            .optional()?;
        Ok(target)
    }

    /// Every target, newest month first.
    pub fn list_all(conn: &Connection) -> Result<Vec<Target>> {
        let mut stmt = conn.prepare(
            "SELECT id, user_id, year, month, target_amount, created_at, updated_at
             FROM targets ORDER BY year DESC, month DESC",
        )?;
        let targets = stmt
            .query_map([], target_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(targets)
    }

    /// One user's targets, newest month first.
    pub fn list_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Target>> {
        let mut stmt = conn.prepare(
            "SELECT id, user_id, year, month, target_amount, created_at, updated_at
             FROM targets WHERE user_id = ?1 ORDER BY year DESC, month DESC",
        )?;
        let targets = stmt
            .query_map(params![user_id], target_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(targets)
    }

    /// Replace the amount of a target.
    pub fn update_amount(conn: &Connection, id: &str, target_amount: f64) -> Result<Target> {
        let changed = conn.execute(
            "UPDATE targets SET target_amount = ?1, updated_at = ?2 WHERE id = ?3",
            params![target_amount, now_iso(), id],
        )?;
        if changed == 0 {
            return Err(SalesError::NotFound("target".to_string()));
        }
        Self::get(conn, id)?.ok_or_else(|| SalesError::NotFound("target".to_string()))
    }

    /// Delete a target. Returns true if a row was deleted.
    pub fn delete(conn: &Connection, id: &str) -> Result<bool> {
        let changed = conn.execute("DELETE FROM targets WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Sum of target amounts for a month, optionally restricted to a
    /// user set.
    pub fn sum_for_month(
        conn: &Connection,
        user_ids: Option<&[String]>,
        year: i32,
        month: u32,
    ) -> Result<f64> {
        match user_ids {
            None => {
                let total = conn.query_row(
                    "SELECT COALESCE(SUM(target_amount), 0) FROM targets
                     WHERE year = ?1 AND month = ?2",
                    params![year, month],
                    |row| row.get(0),
                )?;
                Ok(total)
            }
            Some([]) => Ok(0.0),
            Some(ids) => {
                let placeholders = vec!["?"; ids.len()].join(", ");
                let sql = format!(
                    "SELECT COALESCE(SUM(target_amount), 0) FROM targets
                     WHERE year = ? AND month = ? AND user_id IN ({placeholders})"
                );
                let mut values: Vec<Box<dyn rusqlite::types::ToSql>> =
                    vec![Box::new(year), Box::new(month)];
                for id in ids {
                    values.push(Box::new(id.clone()));
                }
                let params_refs: Vec<&dyn rusqlite::types::ToSql> =
                    values.iter().map(AsRef::as_ref).collect();
                let total = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
                Ok(total)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        fieldops_store::migrations::run_migrations(&conn).unwrap();
        conn
    }

    fn insert_user(conn: &Connection, username: &str) -> String {
        let id = generate_id(ids::USER);
        conn.execute(
            "INSERT INTO users (id, username, password_hash, first_name, last_name, created_at)
             VALUES (?1, ?2, 'x', 'Test', ?2, '2024-01-01T00:00:00Z')",
            params![id, username],
        )
        .unwrap();
        id
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn insert_sale(conn: &Connection, rep: &str, day: &str, net: f64) {
        TradeRepository::create_sale(
            conn, rep, date(day), "Analgesics", "Vitapharm", "Parol 500mg", 10, net / 10.0, net,
            net, None, None,
        )
        .unwrap();
    }

    #[test]
    fn sale_roundtrip() {
        let conn = setup_db();
        let rep = insert_user(&conn, "rep");
        let sale = TradeRepository::create_sale(
            &conn,
            &rep,
            date("2024-03-05"),
            "Analgesics",
            "Vitapharm",
            "Parol 500mg",
            10,
            12.5,
            125.0,
            125.0,
            Some("Acme Pharmacy"),
            None,
        )
        .unwrap();
        assert!(sale.id.starts_with("sale-"));
        assert_eq!(sale.date, date("2024-03-05"));
        assert!((sale.net_price - 125.0).abs() < f64::EPSILON);
    }

    #[test]
    fn list_scoped_to_representatives() {
        let conn = setup_db();
        let a = insert_user(&conn, "a");
        let b = insert_user(&conn, "b");
        insert_sale(&conn, &a, "2024-03-01", 100.0);
        insert_sale(&conn, &b, "2024-03-01", 200.0);

        let scoped = TradeRepository::list_sales(
            &conn,
            &TradeFilter {
                representative_ids: Some(vec![a.clone()]),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].representative_id, a);
    }

    #[test]
    fn empty_scope_matches_nothing() {
        let conn = setup_db();
        let a = insert_user(&conn, "a");
        insert_sale(&conn, &a, "2024-03-01", 100.0);

        let none = TradeRepository::list_sales(
            &conn,
            &TradeFilter {
                representative_ids: Some(vec![]),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn date_window_filters() {
        let conn = setup_db();
        let a = insert_user(&conn, "a");
        insert_sale(&conn, &a, "2024-02-15", 50.0);
        insert_sale(&conn, &a, "2024-03-15", 60.0);
        insert_sale(&conn, &a, "2024-04-15", 70.0);

        let march = TradeRepository::list_sales(
            &conn,
            &TradeFilter {
                representative_ids: None,
                start_date: Some(date("2024-03-01")),
                end_date: Some(date("2024-03-31")),
            },
        )
        .unwrap();
        assert_eq!(march.len(), 1);
        assert_eq!(march[0].date, date("2024-03-15"));
    }

    #[test]
    fn sums_respect_filter() {
        let conn = setup_db();
        let a = insert_user(&conn, "a");
        let b = insert_user(&conn, "b");
        insert_sale(&conn, &a, "2024-03-01", 100.0);
        insert_sale(&conn, &b, "2024-03-01", 50.0);

        let all = TradeRepository::sum_net_sales(&conn, &TradeFilter::default()).unwrap();
        assert!((all - 150.0).abs() < f64::EPSILON);

        let only_a =
            TradeRepository::sum_net_sales(&conn, &TradeFilter::for_representative(&a)).unwrap();
        assert!((only_a - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn month_sums_are_month_bounded() {
        let conn = setup_db();
        let a = insert_user(&conn, "a");
        insert_sale(&conn, &a, "2024-03-31", 100.0);
        insert_sale(&conn, &a, "2024-04-01", 999.0);

        let march = TradeRepository::month_net_sales(&conn, &a, 2024, 3).unwrap();
        assert!((march - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn duplicate_target_is_conflict() {
        let conn = setup_db();
        let user = insert_user(&conn, "rep");
        TargetRepository::create(&conn, &user, 2024, 3, 100_000.0).unwrap();
        let err = TargetRepository::create(&conn, &user, 2024, 3, 200_000.0).unwrap_err();
        assert!(matches!(err, SalesError::DuplicateTarget));

        // A different month is fine.
        TargetRepository::create(&conn, &user, 2024, 4, 200_000.0).unwrap();
    }

    #[test]
    fn target_update_and_delete() {
        let conn = setup_db();
        let user = insert_user(&conn, "rep");
        let target = TargetRepository::create(&conn, &user, 2024, 3, 100_000.0).unwrap();

        let updated = TargetRepository::update_amount(&conn, &target.id, 150_000.0).unwrap();
        assert!((updated.target_amount - 150_000.0).abs() < f64::EPSILON);

        assert!(TargetRepository::delete(&conn, &target.id).unwrap());
        assert!(TargetRepository::get(&conn, &target.id).unwrap().is_none());
    }

    #[test]
    fn sum_for_month_scoping() {
        let conn = setup_db();
        let a = insert_user(&conn, "a");
        let b = insert_user(&conn, "b");
        TargetRepository::create(&conn, &a, 2024, 3, 100.0).unwrap();
        TargetRepository::create(&conn, &b, 2024, 3, 50.0).unwrap();

        let all = TargetRepository::sum_for_month(&conn, None, 2024, 3).unwrap();
        assert!((all - 150.0).abs() < f64::EPSILON);

        let only_a =
            TargetRepository::sum_for_month(&conn, Some(&[a.clone()]), 2024, 3).unwrap();
        assert!((only_a - 100.0).abs() < f64::EPSILON);

        let empty = TargetRepository::sum_for_month(&conn, Some(&[]), 2024, 3).unwrap();
        assert!(empty.abs() < f64::EPSILON);
    }
}
