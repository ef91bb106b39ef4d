//! End-to-end scenarios against the seeded stores
//!
//! The seed fixes account 1 at 1000 and account 2 at 5000 minor units; every
//! scenario starts from that state with a fresh manager.

use std::sync::Arc;

use tandem::{
    seed_sample_data, Catalog, Error, Inventory, OpRequest, Restartable, Row, TransactionManager,
    TransactionStatus,
};

fn setup() -> Arc<TransactionManager> {
    let manager = Arc::new(TransactionManager::new(Catalog::bootstrap()));
    seed_sample_data(manager.store()).unwrap();
    manager
}

fn balance(mgr: &TransactionManager, id: i64) -> i64 {
    mgr.store()
        .select_by_key("financial", "accounts", id)
        .unwrap()
        .unwrap()
        .i64("balance")
        .unwrap()
}

#[test]
fn simple_transfer_commits() {
    let mgr = setup();

    mgr.begin("c1").unwrap();
    let row = mgr
        .execute("c1", OpRequest::select("financial", "accounts", 1))
        .unwrap()
        .row()
        .unwrap();
    assert_eq!(row.i64("balance"), Some(1000));

    mgr.execute(
        "c1",
        OpRequest::update("financial", "accounts", 1, Row::new().with("balance", 900i64)),
    )
    .unwrap();
    mgr.execute(
        "c1",
        OpRequest::update(
            "financial",
            "accounts",
            2,
            Row::new().with("balance", 5100i64),
        ),
    )
    .unwrap();
    mgr.commit("c1").unwrap();

    assert_eq!(balance(&mgr, 1), 900);
    assert_eq!(balance(&mgr, 2), 5100);
}

#[test]
fn business_rollback_after_debit_restores_both_accounts() {
    let mgr = setup();

    mgr.begin("c1").unwrap();
    let row = mgr
        .execute("c1", OpRequest::select("financial", "accounts", 1))
        .unwrap()
        .row()
        .unwrap();
    assert_eq!(row.i64("balance"), Some(1000));
    mgr.execute(
        "c1",
        OpRequest::update("financial", "accounts", 1, Row::new().with("balance", 900i64)),
    )
    .unwrap();

    // the business layer decides the funds are insufficient and backs out
    mgr.rollback("c1").unwrap();

    assert_eq!(balance(&mgr, 1), 1000);
    assert_eq!(balance(&mgr, 2), 5000);
}

#[test]
fn read_then_lost_write_restarts_and_retry_succeeds() {
    let mgr = setup();

    mgr.begin("c1").unwrap();
    mgr.begin("c2").unwrap();

    // c1 reads account 1 at its snapshot position
    let seen = mgr
        .execute("c1", OpRequest::select("financial", "accounts", 1))
        .unwrap()
        .row()
        .unwrap();
    assert_eq!(seen.i64("balance"), Some(1000));

    // the younger c2 writes the same account and commits
    mgr.execute(
        "c2",
        OpRequest::update("financial", "accounts", 1, Row::new().with("balance", 800i64)),
    )
    .unwrap();
    mgr.commit("c2").unwrap();

    // c1's write is now behind the committed younger writer
    let err = mgr
        .execute(
            "c1",
            OpRequest::update("financial", "accounts", 1, Row::new().with("balance", 700i64)),
        )
        .unwrap_err();
    assert!(matches!(err, Error::RestartRequired { .. }));

    // the retry observes the new value and proceeds
    let fresh = mgr
        .execute("c1", OpRequest::select("financial", "accounts", 1))
        .unwrap()
        .row()
        .unwrap();
    assert_eq!(fresh.i64("balance"), Some(800));
    mgr.execute(
        "c1",
        OpRequest::update("financial", "accounts", 1, Row::new().with("balance", 750i64)),
    )
    .unwrap();
    mgr.commit("c1").unwrap();

    assert_eq!(balance(&mgr, 1), 750);
}

#[test]
fn uncommitted_younger_writer_restarts_older_writer() {
    let mgr = setup();

    let t1 = mgr.begin("c1").unwrap();
    let t2 = mgr.begin("c2").unwrap();
    let ts1 = mgr.transaction_start_ts(t1).unwrap();
    let ts2 = mgr.transaction_start_ts(t2).unwrap();
    assert!(ts2 > ts1);

    // the younger transaction writes first and stays uncommitted
    mgr.execute(
        "c2",
        OpRequest::update("financial", "accounts", 1, Row::new().with("balance", 640i64)),
    )
    .unwrap();

    // the older writer must restart
    let err = mgr
        .execute(
            "c1",
            OpRequest::update("financial", "accounts", 1, Row::new().with("balance", 1i64)),
        )
        .unwrap_err();
    assert!(err.is_restartable());

    let t3 = mgr.active_tid("c1").unwrap();
    let ts3 = mgr.transaction_start_ts(t3).unwrap();
    assert!(ts3 > ts2, "the restarted attempt is younger than both");

    // after the younger commit, the restarted writer goes through
    mgr.commit("c2").unwrap();
    mgr.execute(
        "c1",
        OpRequest::update("financial", "accounts", 1, Row::new().with("balance", 600i64)),
    )
    .unwrap();
    mgr.commit("c1").unwrap();

    assert_eq!(balance(&mgr, 1), 600);
}

#[test]
fn order_placement_spans_both_databases_atomically() {
    let mgr = setup();
    let inventory = Inventory::new(Arc::clone(&mgr));

    let order_id = inventory.place_order("c1", 1, 2, &[(3, 2)]).unwrap();

    // inventory side: order confirmed, stock decremented, items written
    let order = mgr
        .store()
        .select_by_key("inventory", "orders", order_id)
        .unwrap()
        .unwrap();
    assert_eq!(order.str("status"), Some("confirmed"));
    assert_eq!(
        mgr.store()
            .select_by_key("inventory", "products", 3)
            .unwrap()
            .unwrap()
            .i64("stock"),
        Some(48)
    );
    // financial side: payment debited and recorded
    assert_eq!(balance(&mgr, 2), 4000);
    assert_eq!(
        mgr.store()
            .select_all("financial", "transactions")
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn failed_order_step_reverts_all_four_tables() {
    let mgr = setup();
    // an existing ledger row for the final insert to collide with
    mgr.store()
        .insert(
            "financial",
            "transactions",
            Row::new().with("id", 1i64).with("amount", 0i64),
        )
        .unwrap();

    mgr.begin("c1").unwrap();
    let order_id = mgr
        .execute(
            "c1",
            OpRequest::insert(
                "inventory",
                "orders",
                Row::new().with("user_id", 1i64).with("status", "pending"),
            ),
        )
        .unwrap()
        .inserted()
        .unwrap();
    mgr.execute(
        "c1",
        OpRequest::update("inventory", "products", 3, Row::new().with("stock", 48i64)),
    )
    .unwrap();
    mgr.execute(
        "c1",
        OpRequest::update("financial", "accounts", 1, Row::new().with("balance", 0i64)),
    )
    .unwrap();

    // final step collides on a supplied primary key
    let err = mgr
        .execute(
            "c1",
            OpRequest::insert(
                "financial",
                "transactions",
                Row::new().with("id", 1i64).with("amount", 1000i64),
            ),
        )
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateKey { .. }));

    // a store failure leaves the transaction ACTIVE; the caller backs out
    mgr.rollback("c1").unwrap();

    assert!(mgr
        .store()
        .select_by_key("inventory", "orders", order_id)
        .unwrap()
        .is_none());
    assert_eq!(
        mgr.store()
            .select_by_key("inventory", "products", 3)
            .unwrap()
            .unwrap()
            .i64("stock"),
        Some(50)
    );
    assert_eq!(balance(&mgr, 1), 1000);
    assert_eq!(
        mgr.store()
            .select_all("financial", "transactions")
            .unwrap()
            .len(),
        1,
        "only the pre-existing ledger row survives"
    );
    assert_eq!(
        mgr.store()
            .select_by_key("financial", "transactions", 1)
            .unwrap()
            .unwrap()
            .i64("amount"),
        Some(0)
    );
}

#[test]
fn deadlock_victim_is_youngest_and_other_side_commits() {
    let mgr = setup();

    let t1 = mgr.begin("c1").unwrap();
    let t2 = mgr.begin("c2").unwrap();

    // a lock-based extension would add these edges while blocking; the
    // default policy never does, so inject them through the edge API
    mgr.controller().add_wait_edge(t1, t2);
    mgr.controller().add_wait_edge(t2, t1);

    // the older transaction is not the victim and keeps running
    mgr.execute(
        "c1",
        OpRequest::update("financial", "accounts", 1, Row::new().with("balance", 999i64)),
    )
    .unwrap();

    // the youngest member of the cycle is aborted and restarted
    let err = mgr
        .execute("c2", OpRequest::select("financial", "accounts", 2))
        .unwrap_err();
    assert!(matches!(err, Error::Deadlock { tid } if tid == t2));
    assert_eq!(mgr.transaction_status(t2), Some(TransactionStatus::Aborted));
    assert!(mgr.active_tid("c2").is_some());

    mgr.commit("c1").unwrap();
    assert_eq!(mgr.transaction_status(t1), Some(TransactionStatus::Committed));
    assert_eq!(balance(&mgr, 1), 999);
}
