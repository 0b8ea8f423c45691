//! Request and response bodies of the pharmacy HTTP API.
//!
//! Money is always an integer number of minor units (`*_minor` fields).
//! Roles and statuses travel as plain strings and are validated by the
//! server.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Generic `{"message": ...}` body.
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginRequest {
        pub username: String,
        pub password: String,
    }

    /// Minimal view of the logged in account.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginUser {
        pub id: i64,
        pub username: String,
        pub role: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub message: String,
        pub token: String,
        pub user: LoginUser,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserNew {
        pub username: String,
        pub password: String,
        pub real_name: Option<String>,
        pub phone: Option<String>,
        /// `admin` or `staff` (default).
        pub role: Option<String>,
    }

    /// Every field is optional; an empty password keeps the current one.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserUpdate {
        pub password: Option<String>,
        pub real_name: Option<String>,
        pub phone: Option<String>,
        pub role: Option<String>,
    }
}

pub mod medicine {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MedicineList {
        /// Substring of the name or code.
        pub search: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MedicineNew {
        pub code: String,
        pub name: String,
        #[serde(rename = "type")]
        pub kind: String,
        pub spec: Option<String>,
        pub price_minor: i64,
        pub stock: Option<i64>,
        pub manufacturer: Option<String>,
        /// `active` (default) or `inactive`.
        pub status: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MedicineUpdate {
        pub code: Option<String>,
        pub name: Option<String>,
        #[serde(rename = "type")]
        pub kind: Option<String>,
        pub spec: Option<String>,
        pub price_minor: Option<i64>,
        pub manufacturer: Option<String>,
        pub status: Option<String>,
    }
}

pub mod customer {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CustomerNew {
        pub name: String,
        pub phone: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CustomerUpdate {
        pub name: Option<String>,
        pub phone: Option<String>,
    }
}

pub mod supplier {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SupplierNew {
        pub name: String,
        pub contact: Option<String>,
        pub phone: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SupplierUpdate {
        pub name: Option<String>,
        pub contact: Option<String>,
        pub phone: Option<String>,
    }
}

pub mod stock {
    use super::*;

    /// Receive a shipment.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct InboundNew {
        pub medicine_id: i64,
        pub supplier_id: Option<i64>,
        pub quantity: i64,
        pub unit_price_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SaleNew {
        pub medicine_id: i64,
        pub customer_id: Option<i64>,
        pub quantity: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SaleReturn {
        pub sale_id: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseReturn {
        pub inbound_id: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StockAdjust {
        pub medicine_id: i64,
        pub new_stock: i64,
    }
}

pub mod report {
    use super::*;

    /// Inclusive calendar-day range; either end may be omitted.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct DateRangeQuery {
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct FinancialQuery {
        /// `daily` or `monthly` (default).
        #[serde(rename = "type")]
        pub kind: Option<String>,
    }
}

pub mod analysis {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TopSellingParams {
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
        /// `total_sold` (default), `total_revenue` or `total_profit`.
        pub sort_by: Option<String>,
        /// `ASC` or `DESC` (default).
        pub order: Option<String>,
        pub limit: Option<u64>,
    }
}

pub mod search {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SearchQuery {
        pub keyword: Option<String>,
    }
}

pub mod system {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BackupQuery {
        /// `json` (default) or `sql`.
        pub format: Option<String>,
    }

    /// Connection parameters of the MySQL database.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct DatabaseConfig {
        pub host: String,
        pub port: u16,
        pub user: String,
        pub password: String,
        pub database: String,
    }

    impl Default for DatabaseConfig {
        fn default() -> Self {
            Self {
                host: "127.0.0.1".to_string(),
                port: 3306,
                user: "root".to_string(),
                password: "root".to_string(),
                database: "pharma_db".to_string(),
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DatabaseStatus {
        pub connected: bool,
    }
}
