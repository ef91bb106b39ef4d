//! Typed records over row bags
//!
//! Tables store untyped rows; these structs give the services a typed view.
//! `Entity` fixes where a record lives and converts to and from the row shape
//! the generic undo/replay path works with. Money is minor units throughout.

use tandem_core::{RecordId, Row};

/// A record type bound to one table
pub trait Entity: Sized {
    /// Database the table lives in
    const DATABASE: &'static str;
    /// Table the records live in
    const TABLE: &'static str;

    /// Convert to the stored row shape; `id` is included only when present
    fn to_row(&self) -> Row;

    /// Rebuild from a stored row; `None` when required fields are missing
    fn from_row(row: &Row) -> Option<Self>;
}

/// A user of both systems
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Primary key, absent before insert
    pub id: Option<RecordId>,
    /// Login name
    pub username: String,
    /// Contact address
    pub email: String,
    /// Soft-delete flag
    pub active: bool,
}

impl Entity for User {
    const DATABASE: &'static str = "financial";
    const TABLE: &'static str = "users";

    fn to_row(&self) -> Row {
        let mut row = Row::new()
            .with("username", self.username.clone())
            .with("email", self.email.clone())
            .with("active", self.active);
        if let Some(id) = self.id {
            row.set_id(id);
        }
        row
    }

    fn from_row(row: &Row) -> Option<Self> {
        Some(User {
            id: row.id(),
            username: row.str("username")?.to_string(),
            email: row.str("email")?.to_string(),
            active: row.bool("active").unwrap_or(true),
        })
    }
}

/// A bank account in the financial store
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Primary key, absent before insert
    pub id: Option<RecordId>,
    /// Owning user
    pub user_id: RecordId,
    /// Human-facing account number
    pub number: String,
    /// Balance in minor units
    pub balance: i64,
    /// "checking" or "savings"
    pub kind: String,
    /// Soft-delete flag
    pub active: bool,
}

impl Entity for Account {
    const DATABASE: &'static str = "financial";
    const TABLE: &'static str = "accounts";

    fn to_row(&self) -> Row {
        let mut row = Row::new()
            .with("user_id", self.user_id)
            .with("number", self.number.clone())
            .with("balance", self.balance)
            .with("kind", self.kind.clone())
            .with("active", self.active);
        if let Some(id) = self.id {
            row.set_id(id);
        }
        row
    }

    fn from_row(row: &Row) -> Option<Self> {
        Some(Account {
            id: row.id(),
            user_id: row.i64("user_id")?,
            number: row.str("number")?.to_string(),
            balance: row.i64("balance")?,
            kind: row.str("kind")?.to_string(),
            active: row.bool("active").unwrap_or(true),
        })
    }
}

/// One movement of money, recorded in `financial.transactions`
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    /// Primary key, absent before insert
    pub id: Option<RecordId>,
    /// Debited account; absent for deposits
    pub from_account: Option<RecordId>,
    /// Credited account; absent for withdrawals and payments
    pub to_account: Option<RecordId>,
    /// Amount in minor units
    pub amount: i64,
    /// "transfer", "deposit", "withdrawal" or "payment"
    pub kind: String,
    /// Free-form description
    pub note: String,
    /// RFC 3339 creation time
    pub at: String,
    /// "completed" or "failed"
    pub status: String,
}

impl Entity for LedgerEntry {
    const DATABASE: &'static str = "financial";
    const TABLE: &'static str = "transactions";

    fn to_row(&self) -> Row {
        let mut row = Row::new()
            .with("amount", self.amount)
            .with("kind", self.kind.clone())
            .with("note", self.note.clone())
            .with("at", self.at.clone())
            .with("status", self.status.clone());
        match self.from_account {
            Some(from) => row.set("from_account", from),
            None => row.set("from_account", tandem_core::Value::Null),
        }
        match self.to_account {
            Some(to) => row.set("to_account", to),
            None => row.set("to_account", tandem_core::Value::Null),
        }
        if let Some(id) = self.id {
            row.set_id(id);
        }
        row
    }

    fn from_row(row: &Row) -> Option<Self> {
        Some(LedgerEntry {
            id: row.id(),
            from_account: row.i64("from_account"),
            to_account: row.i64("to_account"),
            amount: row.i64("amount")?,
            kind: row.str("kind")?.to_string(),
            note: row.str("note").unwrap_or_default().to_string(),
            at: row.str("at").unwrap_or_default().to_string(),
            status: row.str("status").unwrap_or("completed").to_string(),
        })
    }
}

/// A product category
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// Primary key, absent before insert
    pub id: Option<RecordId>,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Parent category, for nesting
    pub parent: Option<RecordId>,
}

impl Entity for Category {
    const DATABASE: &'static str = "inventory";
    const TABLE: &'static str = "categories";

    fn to_row(&self) -> Row {
        let mut row = Row::new()
            .with("name", self.name.clone())
            .with("description", self.description.clone());
        match self.parent {
            Some(parent) => row.set("parent", parent),
            None => row.set("parent", tandem_core::Value::Null),
        }
        if let Some(id) = self.id {
            row.set_id(id);
        }
        row
    }

    fn from_row(row: &Row) -> Option<Self> {
        Some(Category {
            id: row.id(),
            name: row.str("name")?.to_string(),
            description: row.str("description").unwrap_or_default().to_string(),
            parent: row.i64("parent"),
        })
    }
}

/// A sellable product with tracked stock
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Primary key, absent before insert
    pub id: Option<RecordId>,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Unit price in minor units
    pub price: i64,
    /// Units in stock
    pub stock: i64,
    /// Owning category
    pub category_id: RecordId,
    /// Soft-delete flag
    pub active: bool,
}

impl Entity for Product {
    const DATABASE: &'static str = "inventory";
    const TABLE: &'static str = "products";

    fn to_row(&self) -> Row {
        let mut row = Row::new()
            .with("name", self.name.clone())
            .with("description", self.description.clone())
            .with("price", self.price)
            .with("stock", self.stock)
            .with("category_id", self.category_id)
            .with("active", self.active);
        if let Some(id) = self.id {
            row.set_id(id);
        }
        row
    }

    fn from_row(row: &Row) -> Option<Self> {
        Some(Product {
            id: row.id(),
            name: row.str("name")?.to_string(),
            description: row.str("description").unwrap_or_default().to_string(),
            price: row.i64("price")?,
            stock: row.i64("stock")?,
            category_id: row.i64("category_id")?,
            active: row.bool("active").unwrap_or(true),
        })
    }
}

/// A customer order
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Primary key, absent before insert
    pub id: Option<RecordId>,
    /// Ordering user
    pub user_id: RecordId,
    /// Order total in minor units
    pub total: i64,
    /// "pending", "confirmed" or "cancelled"
    pub status: String,
    /// RFC 3339 creation time
    pub created_at: String,
    /// RFC 3339 last update time
    pub updated_at: String,
}

impl Entity for Order {
    const DATABASE: &'static str = "inventory";
    const TABLE: &'static str = "orders";

    fn to_row(&self) -> Row {
        let mut row = Row::new()
            .with("user_id", self.user_id)
            .with("total", self.total)
            .with("status", self.status.clone())
            .with("created_at", self.created_at.clone())
            .with("updated_at", self.updated_at.clone());
        if let Some(id) = self.id {
            row.set_id(id);
        }
        row
    }

    fn from_row(row: &Row) -> Option<Self> {
        Some(Order {
            id: row.id(),
            user_id: row.i64("user_id")?,
            total: row.i64("total")?,
            status: row.str("status")?.to_string(),
            created_at: row.str("created_at").unwrap_or_default().to_string(),
            updated_at: row.str("updated_at").unwrap_or_default().to_string(),
        })
    }
}

/// One line of an order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    /// Primary key, absent before insert
    pub id: Option<RecordId>,
    /// Owning order
    pub order_id: RecordId,
    /// Ordered product
    pub product_id: RecordId,
    /// Ordered units
    pub quantity: i64,
    /// Unit price at order time, minor units
    pub unit_price: i64,
    /// Line total in minor units
    pub total: i64,
}

impl Entity for OrderItem {
    const DATABASE: &'static str = "inventory";
    const TABLE: &'static str = "order_items";

    fn to_row(&self) -> Row {
        let mut row = Row::new()
            .with("order_id", self.order_id)
            .with("product_id", self.product_id)
            .with("quantity", self.quantity)
            .with("unit_price", self.unit_price)
            .with("total", self.total);
        if let Some(id) = self.id {
            row.set_id(id);
        }
        row
    }

    fn from_row(row: &Row) -> Option<Self> {
        Some(OrderItem {
            id: row.id(),
            order_id: row.i64("order_id")?,
            product_id: row.i64("product_id")?,
            quantity: row.i64("quantity")?,
            unit_price: row.i64("unit_price")?,
            total: row.i64("total")?,
        })
    }
}
