//! Deterministic sample data
//!
//! Seeds the fixed records the shell demos and the end-to-end suite rely on:
//! account 1 holds 1000 minor units, account 2 holds 5000, and three products
//! exist with known prices and stock. Seeding writes through the store
//! adapter directly; it happens before the system starts serving
//! transactions.

use crate::entities::{Account, Category, Entity, Product, User};
use tandem_concurrency::StoreAdapter;
use tandem_core::Result;

/// Insert the sample users, accounts, categories, and products
pub fn seed_sample_data(store: &StoreAdapter) -> Result<()> {
    let users = [
        User {
            id: Some(1),
            username: "alice".into(),
            email: "alice@example.com".into(),
            active: true,
        },
        User {
            id: Some(2),
            username: "bob".into(),
            email: "bob@example.com".into(),
            active: true,
        },
    ];
    for user in &users {
        store.insert(User::DATABASE, User::TABLE, user.to_row())?;
    }

    let accounts = [
        Account {
            id: Some(1),
            user_id: 1,
            number: "ACC-0001".into(),
            balance: 1000,
            kind: "checking".into(),
            active: true,
        },
        Account {
            id: Some(2),
            user_id: 2,
            number: "ACC-0002".into(),
            balance: 5000,
            kind: "checking".into(),
            active: true,
        },
    ];
    for account in &accounts {
        store.insert(Account::DATABASE, Account::TABLE, account.to_row())?;
    }

    let hardware = Category {
        id: Some(1),
        name: "hardware".into(),
        description: "fasteners and parts".into(),
        parent: None,
    };
    store.insert(Category::DATABASE, Category::TABLE, hardware.to_row())?;

    let products = [
        Product {
            id: Some(1),
            name: "bolt".into(),
            description: "M6 hex bolt".into(),
            price: 150,
            stock: 100,
            category_id: 1,
            active: true,
        },
        Product {
            id: Some(2),
            name: "nut".into(),
            description: "M6 hex nut".into(),
            price: 75,
            stock: 200,
            category_id: 1,
            active: true,
        },
        Product {
            id: Some(3),
            name: "gear".into(),
            description: "24-tooth spur gear".into(),
            price: 500,
            stock: 50,
            category_id: 1,
            active: true,
        },
    ];
    for product in &products {
        store.insert(Product::DATABASE, Product::TABLE, product.to_row())?;
    }

    tracing::info!("sample data seeded");
    Ok(())
}
