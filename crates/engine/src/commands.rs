//! Command structs for engine operations.
//!
//! These types group parameters for write operations (stock movements and
//! catalog create/update), keeping call sites readable and avoiding long
//! argument lists. Update commands carry `Option` fields: `None` leaves the
//! stored value untouched.

use crate::{MedicineStatus, MoneyCents, Role};

/// Receive a shipment into stock.
#[derive(Clone, Debug)]
pub struct ReceiveStockCmd {
    pub medicine_id: i64,
    pub supplier_id: Option<i64>,
    pub quantity: i64,
    pub unit_price: MoneyCents,
}

impl ReceiveStockCmd {
    #[must_use]
    pub fn new(medicine_id: i64, quantity: i64, unit_price: MoneyCents) -> Self {
        Self {
            medicine_id,
            supplier_id: None,
            quantity,
            unit_price,
        }
    }

    #[must_use]
    pub fn supplier(mut self, supplier_id: i64) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }
}

/// Sell units of a medicine.
#[derive(Clone, Debug)]
pub struct SellStockCmd {
    pub medicine_id: i64,
    pub customer_id: Option<i64>,
    pub quantity: i64,
}

impl SellStockCmd {
    #[must_use]
    pub fn new(medicine_id: i64, quantity: i64) -> Self {
        Self {
            medicine_id,
            customer_id: None,
            quantity,
        }
    }

    #[must_use]
    pub fn customer(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }
}

/// Add a medicine to the catalog.
#[derive(Clone, Debug)]
pub struct NewMedicine {
    pub code: String,
    pub name: String,
    pub kind: String,
    pub spec: Option<String>,
    pub price: MoneyCents,
    /// Opening stock; later changes go through the ledger.
    pub stock: i64,
    pub manufacturer: Option<String>,
    pub status: MedicineStatus,
}

impl NewMedicine {
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        kind: impl Into<String>,
        price: MoneyCents,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            kind: kind.into(),
            spec: None,
            price,
            stock: 0,
            manufacturer: None,
            status: MedicineStatus::Active,
        }
    }

    #[must_use]
    pub fn spec(mut self, spec: impl Into<String>) -> Self {
        self.spec = Some(spec.into());
        self
    }

    #[must_use]
    pub fn stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }

    #[must_use]
    pub fn manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: MedicineStatus) -> Self {
        self.status = status;
        self
    }
}

/// Partial update of a medicine. Stock is not part of it.
#[derive(Clone, Debug, Default)]
pub struct MedicineUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub kind: Option<String>,
    pub spec: Option<String>,
    pub price: Option<MoneyCents>,
    pub manufacturer: Option<String>,
    pub status: Option<MedicineStatus>,
}

impl MedicineUpdate {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn price(mut self, price: MoneyCents) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub fn status(mut self, status: MedicineStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Create a back-office account.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub real_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
}

impl NewUser {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            real_name: None,
            phone: None,
            role: Role::Staff,
        }
    }

    #[must_use]
    pub fn real_name(mut self, real_name: impl Into<String>) -> Self {
        self.real_name = Some(real_name.into());
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Partial update of an account. An empty password keeps the old one.
#[derive(Clone, Debug, Default)]
pub struct UserUpdate {
    pub password: Option<String>,
    pub real_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
}

#[derive(Clone, Debug)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
}

impl NewCustomer {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: None,
        }
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewSupplier {
    pub name: String,
    pub contact: Option<String>,
    pub phone: Option<String>,
}

impl NewSupplier {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact: None,
            phone: None,
        }
    }

    #[must_use]
    pub fn contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct SupplierUpdate {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub phone: Option<String>,
}
