//! Initial schema: creates every table the backend needs if it is missing.
//!
//! - `users`: back-office accounts (argon2 password hashes)
//! - `medicines`: catalog with the denormalized `stock` counter
//! - `customers` / `suppliers`: counterparties of sales and inbounds
//! - `inbounds`: stock receipts (ledger rows that increase stock)
//! - `sales`: sale records (ledger rows that decrease stock)
//!
//! Tables are created with `IF NOT EXISTS` and existing tables are never
//! altered.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    Password,
    RealName,
    Phone,
    Role,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Medicines {
    Table,
    Id,
    Code,
    Name,
    #[iden = "type"]
    Kind,
    Spec,
    PriceMinor,
    Stock,
    Manufacturer,
    Status,
}

#[derive(Iden)]
enum Customers {
    Table,
    Id,
    Name,
    Phone,
    CreatedAt,
}

#[derive(Iden)]
enum Suppliers {
    Table,
    Id,
    Name,
    Contact,
    Phone,
    CreatedAt,
}

#[derive(Iden)]
enum Inbounds {
    Table,
    Id,
    MedicineId,
    SupplierId,
    Quantity,
    UnitPriceMinor,
    InboundDate,
}

#[derive(Iden)]
enum Sales {
    Table,
    Id,
    OrderId,
    MedicineId,
    CustomerId,
    Quantity,
    TotalPriceMinor,
    SaleDate,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::RealName).string())
                    .col(ColumnDef::new(Users::Phone).string())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default("staff"),
                    )
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Medicines
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Medicines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Medicines::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Medicines::Code)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Medicines::Name).string().not_null())
                    .col(ColumnDef::new(Medicines::Kind).string().not_null())
                    .col(ColumnDef::new(Medicines::Spec).string())
                    .col(
                        ColumnDef::new(Medicines::PriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Medicines::Stock)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Medicines::Manufacturer).string())
                    .col(
                        ColumnDef::new(Medicines::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Customers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Customers::Name).string().not_null())
                    .col(ColumnDef::new(Customers::Phone).string())
                    .col(
                        ColumnDef::new(Customers::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Suppliers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Suppliers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Suppliers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Suppliers::Name).string().not_null())
                    .col(ColumnDef::new(Suppliers::Contact).string())
                    .col(ColumnDef::new(Suppliers::Phone).string())
                    .col(
                        ColumnDef::new(Suppliers::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Inbounds (ledger: stock increases)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Inbounds::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Inbounds::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Inbounds::MedicineId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Inbounds::SupplierId).big_integer())
                    .col(ColumnDef::new(Inbounds::Quantity).big_integer().not_null())
                    .col(
                        ColumnDef::new(Inbounds::UnitPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Inbounds::InboundDate)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-inbounds-medicine_id")
                            .from(Inbounds::Table, Inbounds::MedicineId)
                            .to(Medicines::Table, Medicines::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-inbounds-supplier_id")
                            .from(Inbounds::Table, Inbounds::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-inbounds-medicine_id-inbound_date")
                    .table(Inbounds::Table)
                    .col(Inbounds::MedicineId)
                    .col(Inbounds::InboundDate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Sales (ledger: stock decreases)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Sales::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sales::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Sales::OrderId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Sales::MedicineId).big_integer().not_null())
                    .col(ColumnDef::new(Sales::CustomerId).big_integer())
                    .col(ColumnDef::new(Sales::Quantity).big_integer().not_null())
                    .col(
                        ColumnDef::new(Sales::TotalPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Sales::SaleDate).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sales-medicine_id")
                            .from(Sales::Table, Sales::MedicineId)
                            .to(Medicines::Table, Medicines::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sales-customer_id")
                            .from(Sales::Table, Sales::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-sales-medicine_id-sale_date")
                    .table(Sales::Table)
                    .col(Sales::MedicineId)
                    .col(Sales::SaleDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
