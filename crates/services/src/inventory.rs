//! Inventory and ordering services
//!
//! Order placement is the widest unit of work in the system: it reads and
//! writes both stores (order + items + stock in `inventory`, payment in
//! `financial`) inside one transaction. If any step fails, every store
//! reverts.

use crate::entities::{Account, Category, Entity, LedgerEntry, Order, OrderItem, Product, User};
use crate::error::{ServiceError, ServiceResult};
use chrono::Utc;
use std::sync::Arc;
use tandem_concurrency::{OpRequest, TransactionManager};
use tandem_core::{RecordId, Row};

/// Product and order operations
pub struct Inventory {
    manager: Arc<TransactionManager>,
}

fn fetch_product(
    manager: &TransactionManager,
    client: &str,
    id: RecordId,
) -> ServiceResult<Product> {
    let row = manager
        .execute(client, OpRequest::select(Product::DATABASE, Product::TABLE, id))?
        .row()
        .ok_or(ServiceError::NotFound {
            entity: "product",
            id,
        })?;
    Product::from_row(&row).ok_or(ServiceError::NotFound {
        entity: "product",
        id,
    })
}

impl Inventory {
    /// Create an inventory service over `manager`
    pub fn new(manager: Arc<TransactionManager>) -> Self {
        Inventory { manager }
    }

    /// Create a category
    pub fn create_category(
        &self,
        client: &str,
        name: &str,
        description: &str,
        parent: Option<RecordId>,
    ) -> ServiceResult<RecordId> {
        self.manager.with_transaction(client, |m| {
            let category = Category {
                id: None,
                name: name.to_string(),
                description: description.to_string(),
                parent,
            };
            let id = m
                .execute(
                    client,
                    OpRequest::insert(Category::DATABASE, Category::TABLE, category.to_row()),
                )?
                .inserted()
                .expect("insert returns the assigned key");
            Ok(id)
        })
    }

    /// Create a product under an existing category
    pub fn create_product(
        &self,
        client: &str,
        name: &str,
        description: &str,
        price: i64,
        stock: i64,
        category_id: RecordId,
    ) -> ServiceResult<RecordId> {
        self.manager.with_transaction(client, |m| {
            let category = m
                .execute(
                    client,
                    OpRequest::select(Category::DATABASE, Category::TABLE, category_id),
                )?
                .row();
            if category.is_none() {
                return Err(ServiceError::NotFound {
                    entity: "category",
                    id: category_id,
                });
            }

            let product = Product {
                id: None,
                name: name.to_string(),
                description: description.to_string(),
                price,
                stock,
                category_id,
                active: true,
            };
            let id = m
                .execute(
                    client,
                    OpRequest::insert(Product::DATABASE, Product::TABLE, product.to_row()),
                )?
                .inserted()
                .expect("insert returns the assigned key");
            Ok(id)
        })
    }

    /// Read a product
    pub fn product(&self, client: &str, id: RecordId) -> ServiceResult<Product> {
        self.manager
            .with_transaction(client, |m| fetch_product(m, client, id))
    }

    /// Change a product's stock by `delta`, failing if it would go negative
    ///
    /// Returns the new stock level.
    pub fn adjust_stock(
        &self,
        client: &str,
        product_id: RecordId,
        delta: i64,
    ) -> ServiceResult<i64> {
        self.manager.with_transaction(client, |m| {
            let product = fetch_product(m, client, product_id)?;
            let new_stock = product.stock + delta;
            if new_stock < 0 {
                return Err(ServiceError::InsufficientStock {
                    product: product_id,
                    stock: product.stock,
                    requested: -delta,
                });
            }
            m.execute(
                client,
                OpRequest::update(
                    Product::DATABASE,
                    Product::TABLE,
                    product_id,
                    Row::new().with("stock", new_stock),
                ),
            )?;
            Ok(new_stock)
        })
    }

    /// Place an order for `user_id`, paid from `payment_account_id`
    ///
    /// `items` pairs product ids with quantities. One transaction covers the
    /// order row, its items, every stock decrement, the account debit, and
    /// the payment ledger entry, across both databases.
    pub fn place_order(
        &self,
        client: &str,
        user_id: RecordId,
        payment_account_id: RecordId,
        items: &[(RecordId, i64)],
    ) -> ServiceResult<RecordId> {
        self.manager.with_transaction(client, |m| {
            let user = m
                .execute(client, OpRequest::select(User::DATABASE, User::TABLE, user_id))?
                .row();
            if user.is_none() {
                return Err(ServiceError::NotFound {
                    entity: "user",
                    id: user_id,
                });
            }
            let account_row = m
                .execute(
                    client,
                    OpRequest::select(Account::DATABASE, Account::TABLE, payment_account_id),
                )?
                .row()
                .ok_or(ServiceError::NotFound {
                    entity: "account",
                    id: payment_account_id,
                })?;
            let account = Account::from_row(&account_row).ok_or(ServiceError::NotFound {
                entity: "account",
                id: payment_account_id,
            })?;

            // validate every line and compute the total before writing anything
            let mut lines = Vec::with_capacity(items.len());
            let mut total = 0i64;
            for &(product_id, quantity) in items {
                let product = fetch_product(m, client, product_id)?;
                if product.stock < quantity {
                    return Err(ServiceError::InsufficientStock {
                        product: product_id,
                        stock: product.stock,
                        requested: quantity,
                    });
                }
                total += product.price * quantity;
                lines.push((product, quantity));
            }
            if account.balance < total {
                return Err(ServiceError::InsufficientFunds {
                    account: payment_account_id,
                    balance: account.balance,
                    requested: total,
                });
            }

            let now = Utc::now().to_rfc3339();
            let order = Order {
                id: None,
                user_id,
                total,
                status: "pending".into(),
                created_at: now.clone(),
                updated_at: now.clone(),
            };
            let order_id = m
                .execute(
                    client,
                    OpRequest::insert(Order::DATABASE, Order::TABLE, order.to_row()),
                )?
                .inserted()
                .expect("insert returns the assigned key");

            for (product, quantity) in &lines {
                let product_id = product.id.expect("fetched products carry their key");
                let item = OrderItem {
                    id: None,
                    order_id,
                    product_id,
                    quantity: *quantity,
                    unit_price: product.price,
                    total: product.price * quantity,
                };
                m.execute(
                    client,
                    OpRequest::insert(OrderItem::DATABASE, OrderItem::TABLE, item.to_row()),
                )?;
                m.execute(
                    client,
                    OpRequest::update(
                        Product::DATABASE,
                        Product::TABLE,
                        product_id,
                        Row::new().with("stock", product.stock - quantity),
                    ),
                )?;
            }

            m.execute(
                client,
                OpRequest::update(
                    Account::DATABASE,
                    Account::TABLE,
                    payment_account_id,
                    Row::new().with("balance", account.balance - total),
                ),
            )?;
            let payment = LedgerEntry {
                id: None,
                from_account: Some(payment_account_id),
                to_account: None,
                amount: total,
                kind: "payment".into(),
                note: format!("payment for order {}", order_id),
                at: now.clone(),
                status: "completed".into(),
            };
            m.execute(
                client,
                OpRequest::insert(LedgerEntry::DATABASE, LedgerEntry::TABLE, payment.to_row()),
            )?;

            m.execute(
                client,
                OpRequest::update(
                    Order::DATABASE,
                    Order::TABLE,
                    order_id,
                    Row::new().with("status", "confirmed").with("updated_at", now),
                ),
            )?;
            tracing::info!(order = order_id, user = user_id, total, "order placed");
            Ok(order_id)
        })
    }
}
