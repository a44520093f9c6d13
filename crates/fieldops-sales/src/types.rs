//! Sales row types and parameter structs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One sale row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sale {
    /// Row ID (`sale-` prefix).
    pub id: String,
    /// Selling representative.
    pub representative_id: String,
    /// Sale date.
    pub date: NaiveDate,
    /// Product group.
    pub product_group: String,
    /// Brand.
    pub brand: String,
    /// Product name.
    pub product_name: String,
    /// Units sold.
    pub quantity: i64,
    /// Price per unit.
    pub unit_price: f64,
    /// Gross total.
    pub total_price: f64,
    /// Net total after deductions.
    pub net_price: f64,
    /// Customer name, when recorded.
    pub customer_name: Option<String>,
    /// Customer code, when recorded.
    pub customer_code: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// One return row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReturnRecord {
    /// Row ID (`return-` prefix).
    pub id: String,
    /// Representative the return counts against.
    pub representative_id: String,
    /// Return date.
    pub date: NaiveDate,
    /// Product group.
    pub product_group: String,
    /// Brand.
    pub brand: String,
    /// Product name.
    pub product_name: String,
    /// Units returned.
    pub quantity: i64,
    /// Price per unit.
    pub unit_price: f64,
    /// Gross total.
    pub total_price: f64,
    /// Net total.
    pub net_price: f64,
    /// Stated reason, when given.
    pub return_reason: Option<String>,
    /// Customer name, when recorded.
    pub customer_name: Option<String>,
    /// Customer code, when recorded.
    pub customer_code: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// One monthly target row, unique per (user, year, month).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Target {
    /// Row ID (`target-` prefix).
    pub id: String,
    /// The user the target applies to.
    pub user_id: String,
    /// Year.
    pub year: i32,
    /// Month, 1-based.
    pub month: u32,
    /// Target amount.
    pub target_amount: f64,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// A target joined with the month's realized sales.
#[derive(Clone, Debug, Serialize)]
pub struct TargetWithActuals {
    /// The target row.
    #[serde(flatten)]
    pub target: Target,
    /// Net sales total of the month.
    pub total_sales: f64,
    /// Net returns total of the month.
    pub total_returns: f64,
    /// Sales minus returns.
    pub net_sales: f64,
    /// Net sales as a percentage of the target.
    pub completion_rate: f64,
}

/// Input for recording a sale or return. Totals are computed, not
/// client-supplied.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TradeCreateInput {
    /// Trade date.
    pub date: NaiveDate,
    /// Product group.
    pub product_group: String,
    /// Brand.
    pub brand: String,
    /// Product name.
    pub product_name: String,
    /// Units.
    pub quantity: i64,
    /// Price per unit.
    pub unit_price: f64,
    /// Customer name.
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Customer code.
    #[serde(default)]
    pub customer_code: Option<String>,
    /// Return reason (returns only).
    #[serde(default)]
    pub return_reason: Option<String>,
}

/// Row filter for listings and sums.
#[derive(Clone, Debug, Default)]
pub struct TradeFilter {
    /// Restrict to these representatives; `None` means no restriction.
    pub representative_ids: Option<Vec<String>>,
    /// Keep trades on/after this date.
    pub start_date: Option<NaiveDate>,
    /// Keep trades on/before this date.
    pub end_date: Option<NaiveDate>,
}

impl TradeFilter {
    /// Filter for a single representative.
    pub fn for_representative(id: &str) -> Self {
        Self {
            representative_ids: Some(vec![id.to_string()]),
            ..Default::default()
        }
    }
}
