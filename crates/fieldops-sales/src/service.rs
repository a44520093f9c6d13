//! Business logic for the revenue ledger.

use rusqlite::Connection;
use tracing::info;

use crate::errors::{Result, SalesError};
use crate::repository::{TargetRepository, TradeRepository};
use crate::types::{ReturnRecord, Sale, Target, TargetWithActuals, TradeCreateInput};

/// One entry of a bulk target upload.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct BulkTargetEntry {
    /// The user the target applies to.
    pub user_id: String,
    /// Year.
    pub year: i32,
    /// Month, 1-based.
    pub month: u32,
    /// Target amount.
    pub target_amount: f64,
}

/// Sales service with validation and derived totals.
pub struct SalesService;

impl SalesService {
    /// Record a sale for a representative. Totals are derived from
    /// quantity and unit price; clients cannot supply them.
    pub fn record_sale(
        conn: &Connection,
        representative_id: &str,
        input: &TradeCreateInput,
    ) -> Result<Sale> {
        Self::validate(input)?;
        #[allow(clippy::cast_precision_loss)]
        let total = input.quantity as f64 * input.unit_price;
        let sale = TradeRepository::create_sale(
            conn,
            representative_id,
            input.date,
            &input.product_group,
            &input.brand,
            &input.product_name,
            input.quantity,
            input.unit_price,
            total,
            total,
            input.customer_name.as_deref(),
            input.customer_code.as_deref(),
        )?;
        info!(sale_id = %sale.id, representative_id, "sale recorded");
        Ok(sale)
    }

    /// Record a return for a representative.
    pub fn record_return(
        conn: &Connection,
        representative_id: &str,
        input: &TradeCreateInput,
    ) -> Result<ReturnRecord> {
        Self::validate(input)?;
        #[allow(clippy::cast_precision_loss)]
        let total = input.quantity as f64 * input.unit_price;
        let record = TradeRepository::create_return(
            conn,
            representative_id,
            input.date,
            &input.product_group,
            &input.brand,
            &input.product_name,
            input.quantity,
            input.unit_price,
            total,
            total,
            input.return_reason.as_deref(),
            input.customer_name.as_deref(),
            input.customer_code.as_deref(),
        )?;
        info!(return_id = %record.id, representative_id, "return recorded");
        Ok(record)
    }

    /// Create a monthly target; duplicates for the same (user, year,
    /// month) are a conflict.
    pub fn create_target(
        conn: &Connection,
        user_id: &str,
        year: i32,
        month: u32,
        target_amount: f64,
    ) -> Result<Target> {
        if !(1..=12).contains(&month) {
            return Err(SalesError::Validation(format!("invalid month: {month}")));
        }
        if target_amount <= 0.0 {
            return Err(SalesError::Validation(
                "target amount must be positive".to_string(),
            ));
        }
        TargetRepository::create(conn, user_id, year, month, target_amount)
    }

    /// Create many targets at once, in one transaction. Months that
    /// already hold a target are skipped, not errors. Returns
    /// (created, skipped).
    pub fn bulk_create_targets(
        conn: &Connection,
        entries: &[BulkTargetEntry],
    ) -> Result<(usize, usize)> {
        let tx = conn.unchecked_transaction()?;
        let mut created = 0;
        let mut skipped = 0;
        for entry in entries {
            if !(1..=12).contains(&entry.month) || entry.target_amount <= 0.0 {
                return Err(SalesError::Validation(format!(
                    "invalid bulk entry for user {}: month {}, amount {}",
                    entry.user_id, entry.month, entry.target_amount
                )));
            }
            match TargetRepository::create(
                &tx,
                &entry.user_id,
                entry.year,
                entry.month,
                entry.target_amount,
            ) {
                Ok(_) => created += 1,
                Err(SalesError::DuplicateTarget) => skipped += 1,
                Err(other) => return Err(other),
            }
        }
        tx.commit()?;
        info!(created, skipped, "bulk targets processed");
        Ok((created, skipped))
    }

    /// A user's targets joined with realized sales per month.
    pub fn targets_with_actuals(
        conn: &Connection,
        user_id: &str,
    ) -> Result<Vec<TargetWithActuals>> {
        let targets = TargetRepository::list_for_user(conn, user_id)?;
        let mut result = Vec::with_capacity(targets.len());
        for target in targets {
            let total_sales =
                TradeRepository::month_net_sales(conn, user_id, target.year, target.month)?;
            let total_returns =
                TradeRepository::month_net_returns(conn, user_id, target.year, target.month)?;
            let net_sales = total_sales - total_returns;
            let completion_rate = if target.target_amount > 0.0 {
                net_sales / target.target_amount * 100.0
            } else {
                0.0
            };
            result.push(TargetWithActuals {
                target,
                total_sales,
                total_returns,
                net_sales,
                completion_rate,
            });
        }
        Ok(result)
    }

    fn validate(input: &TradeCreateInput) -> Result<()> {
        if input.product_group.trim().is_empty()
            || input.brand.trim().is_empty()
            || input.product_name.trim().is_empty()
        {
            return Err(SalesError::Validation(
                "product group, brand, and product name are required".to_string(),
            ));
        }
        if input.quantity <= 0 {
            return Err(SalesError::Validation("quantity must be positive".to_string()));
        }
        if input.unit_price < 0.0 {
            return Err(SalesError::Validation(
                "unit price cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
