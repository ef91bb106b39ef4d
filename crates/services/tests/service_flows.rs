//! Service flows under concurrent clients

use std::sync::Arc;
use std::thread;

use tandem_concurrency::TransactionManager;
use tandem_services::{seed_sample_data, Bank, Inventory};
use tandem_storage::Catalog;

#[test]
fn parallel_transfers_between_disjoint_pairs_conserve_money() {
    let manager = Arc::new(TransactionManager::new(Catalog::bootstrap()));
    seed_sample_data(manager.store()).unwrap();
    let bank = Arc::new(Bank::new(Arc::clone(&manager)));

    // give each worker its own pair of fresh accounts
    let worker_count = 4;
    let mut pairs = Vec::new();
    {
        let setup = Bank::new(Arc::clone(&manager));
        let user = setup.create_user("setup", "carol", "carol@example.com").unwrap();
        for _ in 0..worker_count {
            let a = setup.create_account("setup", user, "checking", 10_000).unwrap();
            let b = setup.create_account("setup", user, "checking", 10_000).unwrap();
            pairs.push((a, b));
        }
    }

    let handles: Vec<_> = pairs
        .iter()
        .enumerate()
        .map(|(i, &(a, b))| {
            let bank = Arc::clone(&bank);
            thread::spawn(move || {
                let client = format!("worker-{}", i);
                for round in 0..25 {
                    let (from, to) = if round % 2 == 0 { (a, b) } else { (b, a) };
                    bank.transfer(&client, from, to, 100, "shuffle").unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    for &(a, b) in &pairs {
        let left = bank.account("check", a).unwrap().balance;
        let right = bank.account("check", b).unwrap().balance;
        assert_eq!(left + right, 20_000);
    }
    assert_eq!(manager.statistics().active_transactions, 0);
}

#[test]
fn orders_and_transfers_compose_against_the_same_accounts() {
    let manager = Arc::new(TransactionManager::new(Catalog::bootstrap()));
    seed_sample_data(manager.store()).unwrap();
    let bank = Bank::new(Arc::clone(&manager));
    let inventory = Inventory::new(Arc::clone(&manager));

    // account 2: 5000, pays 500 for one gear, receives 300 from account 1
    inventory.place_order("c1", 2, 2, &[(3, 1)]).unwrap();
    bank.transfer("c1", 1, 2, 300, "gift").unwrap();

    assert_eq!(bank.account("c1", 2).unwrap().balance, 4800);
    assert_eq!(bank.account("c1", 1).unwrap().balance, 700);
    assert_eq!(inventory.product("c1", 3).unwrap().stock, 49);

    // the ledger has one payment and one transfer
    let ledger = manager.store().select_all("financial", "transactions").unwrap();
    assert_eq!(ledger.len(), 2);
}
