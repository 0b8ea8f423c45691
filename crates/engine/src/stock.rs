//! Outcomes of the stock operations that do not produce a ledger row.

use serde::{Deserialize, Serialize};

use crate::MoneyCents;

/// Result of undoing a sale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReversal {
    pub sale_id: i64,
    pub medicine_id: i64,
    /// Units put back on the shelf.
    pub quantity: i64,
    #[serde(rename = "refund_amount_minor")]
    pub refund_amount: MoneyCents,
}

/// Result of returning an inbound shipment to its supplier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReversal {
    pub inbound_id: i64,
    pub medicine_id: i64,
    /// Units removed from stock.
    pub quantity: i64,
}

/// Result of overwriting the stock counter after a physical count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub medicine_id: i64,
    pub old_stock: i64,
    pub new_stock: i64,
    /// `new_stock - old_stock`.
    pub difference: i64,
}
