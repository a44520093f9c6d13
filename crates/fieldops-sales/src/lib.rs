//! # fieldops-sales
//!
//! The revenue ledger: sale and return records (scoped, date-filtered),
//! monthly targets unique per (user, year, month), and the report
//! aggregations built on top of them.

#![deny(unsafe_code)]

pub mod errors;
pub mod reports;
pub mod repository;
pub mod service;
pub mod types;

pub use errors::SalesError;
pub use reports::{representatives, summary, RepresentativeReport, SummaryReport};
pub use repository::{TargetRepository, TradeRepository};
pub use service::{BulkTargetEntry, SalesService};
pub use types::{
    ReturnRecord, Sale, Target, TargetWithActuals, TradeCreateInput, TradeFilter,
};
