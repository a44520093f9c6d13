//! Report aggregation over the revenue ledger.

use rusqlite::Connection;
use serde::Serialize;

use fieldops_users::User;

use crate::errors::Result;
use crate::repository::{TargetRepository, TradeRepository};
use crate::types::TradeFilter;

/// The period summary: totals, return rate, and target completion.
#[derive(Clone, Debug, Serialize)]
pub struct SummaryReport {
    /// Net sales total for the period.
    pub total_sales: f64,
    /// Net returns total for the period.
    pub total_returns: f64,
    /// Sales minus returns.
    pub net_sales: f64,
    /// Returns as a percentage of sales.
    pub return_rate: f64,
    /// Target amount for the reference month.
    pub target_amount: f64,
    /// Net sales as a percentage of the target.
    pub target_completion: f64,
}

/// Per-representative performance line.
#[derive(Clone, Debug, Serialize)]
pub struct RepresentativeReport {
    /// The representative.
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Login name.
    pub username: String,
    /// Sales region, when set.
    pub region: Option<String>,
    /// Net sales total for the period.
    pub total_sales: f64,
    /// Net returns total for the period.
    pub total_returns: f64,
    /// Sales minus returns.
    pub net_sales: f64,
    /// Target for the reference month.
    pub target_amount: f64,
    /// Net sales as a percentage of the target.
    pub completion_rate: f64,
}

/// Build the period summary.
///
/// `filter` bounds the trade rows; `target_user_ids` picks whose
/// targets count for the reference month (`None` = everyone's).
pub fn summary(
    conn: &Connection,
    filter: &TradeFilter,
    target_user_ids: Option<&[String]>,
    year: i32,
    month: u32,
) -> Result<SummaryReport> {
    let total_sales = TradeRepository::sum_net_sales(conn, filter)?;
    let total_returns = TradeRepository::sum_net_returns(conn, filter)?;
    let net_sales = total_sales - total_returns;
    let return_rate = if total_sales > 0.0 {
        total_returns / total_sales * 100.0
    } else {
        0.0
    };
    let target_amount = TargetRepository::sum_for_month(conn, target_user_ids, year, month)?;
    let target_completion = if target_amount > 0.0 {
        net_sales / target_amount * 100.0
    } else {
        0.0
    };
    Ok(SummaryReport {
        total_sales,
        total_returns,
        net_sales,
        return_rate,
        target_amount,
        target_completion,
    })
}

/// Build a performance line per representative for the given period.
pub fn representatives(
    conn: &Connection,
    users: &[User],
    start_date: Option<chrono::NaiveDate>,
    end_date: Option<chrono::NaiveDate>,
    year: i32,
    month: u32,
) -> Result<Vec<RepresentativeReport>> {
    let mut report = Vec::with_capacity(users.len());
    for user in users {
        let filter = TradeFilter {
            representative_ids: Some(vec![user.id.clone()]),
            start_date,
            end_date,
        };
        let total_sales = TradeRepository::sum_net_sales(conn, &filter)?;
        let total_returns = TradeRepository::sum_net_returns(conn, &filter)?;
        let net_sales = total_sales - total_returns;
        let target_amount = TargetRepository::get_for_month(conn, &user.id, year, month)?
            .map_or(0.0, |t| t.target_amount);
        let completion_rate = if target_amount > 0.0 {
            net_sales / target_amount * 100.0
        } else {
            0.0
        };
        report.push(RepresentativeReport {
            user_id: user.id.clone(),
            name: user.full_name(),
            username: user.username.clone(),
            region: user.region.clone(),
            total_sales,
            total_returns,
            net_sales,
            target_amount,
            completion_rate,
        });
    }
    Ok(report)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
