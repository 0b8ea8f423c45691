//! Pharmacy inventory engine.
//!
//! The engine owns the database connection and exposes every operation the
//! backend needs: the stock ledger (receive, sell, reverse, adjust), catalog
//! CRUD, reports, sales analysis and backup/restore.
//!
//! Every write runs inside a single database transaction; see [`Engine`].

pub use analysis::{SortOrder, TopSeller, TopSellingQuery, TopSellingSort, TrendPoint};
pub use backup::{Snapshot, SnapshotFormat};
pub use commands::{
    CustomerUpdate, MedicineUpdate, NewCustomer, NewMedicine, NewSupplier, NewUser,
    ReceiveStockCmd, SellStockCmd, SupplierUpdate, UserUpdate,
};
pub use customers::Customer;
pub use error::EngineError;
pub use inbounds::{InboundDetail, InboundRecord};
pub use medicines::{Medicine, MedicineStatus};
pub use money::MoneyCents;
pub use ops::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME, Engine, EngineBuilder};
pub use reports::{
    DashboardStats, FinancialPeriod, FinancialReport, InboundReport, InventoryReport,
    LOW_STOCK_THRESHOLD, SalesReport,
};
pub use sales::{SaleDetail, SaleRecord};
pub use stock::{PurchaseReversal, SaleReversal, StockAdjustment};
pub use suppliers::Supplier;
pub use users::{Role, User};
pub use util::DateRange;

mod analysis;
mod backup;
mod commands;
mod customers;
pub mod database;
mod error;
mod inbounds;
mod medicines;
mod money;
mod ops;
mod password;
mod reports;
mod sales;
mod stock;
mod suppliers;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
