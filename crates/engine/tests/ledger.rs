use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::sync::Barrier;

use engine::{
    DateRange, Engine, EngineError, MoneyCents, NewCustomer, NewMedicine, NewSupplier,
    ReceiveStockCmd, SellStockCmd, database,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> Engine {
    let db = database::open("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

async fn engine_with_file_db() -> (Engine, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db: DatabaseConnection = database::open(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    (engine, path)
}

/// A medicine priced 12.50 with the given opening stock.
async fn medicine(engine: &Engine, code: &str, stock: i64) -> i64 {
    engine
        .create_medicine(
            NewMedicine::new(code, format!("Medicine {code}"), "tablet", MoneyCents::new(1250))
                .stock(stock),
        )
        .await
        .unwrap()
        .id
}

async fn ledger_rows(engine: &Engine) -> (usize, usize) {
    let inbounds = engine.list_inbounds(DateRange::default()).await.unwrap();
    let sales = engine.list_sales(DateRange::default()).await.unwrap();
    (inbounds.len(), sales.len())
}

#[tokio::test]
async fn receive_increases_stock_and_writes_one_row() {
    let engine = engine_with_db().await;
    let medicine_id = medicine(&engine, "AMX", 30).await;

    let inbound = engine
        .receive_stock(ReceiveStockCmd::new(medicine_id, 20, MoneyCents::new(500)))
        .await
        .unwrap();

    assert_eq!(inbound.quantity, 20);
    assert_eq!(inbound.unit_price, MoneyCents::new(500));
    assert_eq!(engine.stock_of(medicine_id).await.unwrap(), 50);
    let inbounds = engine.list_inbounds(DateRange::default()).await.unwrap();
    assert_eq!(inbounds.len(), 1);
    assert_eq!(inbounds[0].record.quantity, 20);
    assert_eq!(inbounds[0].medicine_name.as_deref(), Some("Medicine AMX"));
}

#[tokio::test]
async fn sell_records_total_at_current_price() {
    let engine = engine_with_db().await;
    let medicine_id = medicine(&engine, "AMX", 30).await;
    let customer = engine
        .create_customer(NewCustomer::new("Alice"))
        .await
        .unwrap();

    let sale = engine
        .sell_stock(SellStockCmd::new(medicine_id, 5).customer(customer.id))
        .await
        .unwrap();

    assert_eq!(sale.total_price, MoneyCents::new(6250));
    assert_eq!(sale.customer_id, Some(customer.id));
    assert!(sale.order_id.starts_with("ORD-"));
    assert_eq!(engine.stock_of(medicine_id).await.unwrap(), 25);
}

#[tokio::test]
async fn overselling_fails_and_leaves_stock_untouched() {
    let engine = engine_with_db().await;
    let medicine_id = medicine(&engine, "AMX", 10).await;

    let err = engine
        .sell_stock(SellStockCmd::new(medicine_id, 11))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InsufficientStock(_)));
    assert_eq!(engine.stock_of(medicine_id).await.unwrap(), 10);
    assert_eq!(ledger_rows(&engine).await, (0, 0));
}

#[tokio::test]
async fn invalid_quantities_are_rejected_before_any_write() {
    let engine = engine_with_db().await;
    let medicine_id = medicine(&engine, "AMX", 10).await;

    for quantity in [0, -1] {
        assert!(matches!(
            engine.sell_stock(SellStockCmd::new(medicine_id, quantity)).await,
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            engine
                .receive_stock(ReceiveStockCmd::new(medicine_id, quantity, MoneyCents::new(100)))
                .await,
            Err(EngineError::InvalidAmount(_))
        ));
    }
    assert!(matches!(
        engine.adjust_stock(medicine_id, -1).await,
        Err(EngineError::InvalidAmount(_))
    ));
    assert_eq!(engine.stock_of(medicine_id).await.unwrap(), 10);
}

#[tokio::test]
async fn unknown_medicine_is_not_found() {
    let engine = engine_with_db().await;

    assert!(matches!(
        engine.sell_stock(SellStockCmd::new(404, 1)).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine
            .receive_stock(ReceiveStockCmd::new(404, 1, MoneyCents::new(100)))
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.adjust_stock(404, 3).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn unknown_counterparty_rolls_back_the_stock_change() {
    let engine = engine_with_db().await;
    let medicine_id = medicine(&engine, "AMX", 10).await;

    assert!(matches!(
        engine
            .sell_stock(SellStockCmd::new(medicine_id, 3).customer(999))
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine
            .receive_stock(ReceiveStockCmd::new(medicine_id, 3, MoneyCents::new(100)).supplier(999))
            .await,
        Err(EngineError::KeyNotFound(_))
    ));

    assert_eq!(engine.stock_of(medicine_id).await.unwrap(), 10);
    assert_eq!(ledger_rows(&engine).await, (0, 0));
}

#[tokio::test]
async fn reverse_sale_restores_stock_once() {
    let engine = engine_with_db().await;
    let medicine_id = medicine(&engine, "AMX", 30).await;
    let sale = engine
        .sell_stock(SellStockCmd::new(medicine_id, 5))
        .await
        .unwrap();
    assert_eq!(engine.stock_of(medicine_id).await.unwrap(), 25);

    let reversal = engine.reverse_sale(sale.id).await.unwrap();
    assert_eq!(reversal.quantity, 5);
    assert_eq!(reversal.refund_amount, MoneyCents::new(6250));
    assert_eq!(engine.stock_of(medicine_id).await.unwrap(), 30);
    assert_eq!(ledger_rows(&engine).await, (0, 0));

    assert!(matches!(
        engine.reverse_sale(sale.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert_eq!(engine.stock_of(medicine_id).await.unwrap(), 30);
}

#[tokio::test]
async fn reverse_purchase_needs_the_stock_to_still_be_there() {
    let engine = engine_with_db().await;
    let medicine_id = medicine(&engine, "AMX", 0).await;
    let supplier = engine
        .create_supplier(NewSupplier::new("Acme Pharma"))
        .await
        .unwrap();
    let inbound = engine
        .receive_stock(ReceiveStockCmd::new(medicine_id, 10, MoneyCents::new(400)).supplier(supplier.id))
        .await
        .unwrap();
    engine
        .sell_stock(SellStockCmd::new(medicine_id, 4))
        .await
        .unwrap();

    assert!(matches!(
        engine.reverse_purchase(inbound.id).await,
        Err(EngineError::InsufficientStock(_))
    ));
    assert_eq!(engine.stock_of(medicine_id).await.unwrap(), 6);
    assert_eq!(ledger_rows(&engine).await, (1, 1));

    engine
        .receive_stock(ReceiveStockCmd::new(medicine_id, 4, MoneyCents::new(400)))
        .await
        .unwrap();
    let reversal = engine.reverse_purchase(inbound.id).await.unwrap();
    assert_eq!(reversal.quantity, 10);
    assert_eq!(engine.stock_of(medicine_id).await.unwrap(), 0);
    assert!(matches!(
        engine.reverse_purchase(inbound.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn adjust_to_zero_reports_the_difference() {
    let engine = engine_with_db().await;
    let medicine_id = medicine(&engine, "AMX", 42).await;

    let adjustment = engine.adjust_stock(medicine_id, 0).await.unwrap();

    assert_eq!(adjustment.old_stock, 42);
    assert_eq!(adjustment.new_stock, 0);
    assert_eq!(adjustment.difference, -42);
    assert_eq!(engine.stock_of(medicine_id).await.unwrap(), 0);
    assert_eq!(ledger_rows(&engine).await, (0, 0));
}

#[tokio::test]
async fn stock_equals_ledger_net_after_mixed_operations() {
    let engine = engine_with_db().await;
    let medicine_id = medicine(&engine, "AMX", 0).await;

    let first = engine
        .receive_stock(ReceiveStockCmd::new(medicine_id, 50, MoneyCents::new(300)))
        .await
        .unwrap();
    engine
        .receive_stock(ReceiveStockCmd::new(medicine_id, 20, MoneyCents::new(320)))
        .await
        .unwrap();
    let mut sale_ids = Vec::new();
    for quantity in [7, 3, 12, 1] {
        sale_ids.push(
            engine
                .sell_stock(SellStockCmd::new(medicine_id, quantity))
                .await
                .unwrap()
                .id,
        );
    }
    // rejected operations leave no trace
    let _ = engine.sell_stock(SellStockCmd::new(medicine_id, 1_000)).await;
    engine.reverse_sale(sale_ids[1]).await.unwrap();
    let _ = engine.reverse_purchase(first.id).await;

    let inbounds = engine.list_inbounds(DateRange::default()).await.unwrap();
    let sales = engine.list_sales(DateRange::default()).await.unwrap();
    let received: i64 = inbounds.iter().map(|r| r.record.quantity).sum();
    let sold: i64 = sales.iter().map(|r| r.record.quantity).sum();

    let stock = engine.stock_of(medicine_id).await.unwrap();
    assert_eq!(stock, received - sold);
    assert!(stock >= 0);
}

/// Both sales queue for the single pooled connection.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_never_oversell() {
    let (engine, path) = engine_with_file_db().await;
    let medicine_id = medicine(&engine, "AMX", 10).await;

    let a = engine.clone();
    let b = engine.clone();
    let (first, second) = tokio::join!(
        tokio::spawn(async move { a.sell_stock(SellStockCmd::new(medicine_id, 6)).await }),
        tokio::spawn(async move { b.sell_stock(SellStockCmd::new(medicine_id, 6)).await }),
    );
    let results = [first.unwrap(), second.unwrap()];

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let shortages = results
        .iter()
        .filter(|r| matches!(r, Err(EngineError::InsufficientStock(_))))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(shortages, 1);
    assert_eq!(engine.stock_of(medicine_id).await.unwrap(), 4);

    drop(engine);
    let _ = std::fs::remove_file(path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sales_through_separate_connections_never_oversell() {
    let (engine, path) = engine_with_file_db().await;
    let medicine_id = medicine(&engine, "AMX", 10).await;

    // A second pool on the same file: the two transactions really overlap
    // in SQLite instead of queueing for one pooled connection.
    let url = format!("sqlite:{}?mode=rwc", path.display());
    let other = Engine::builder()
        .database(database::open(&url).await.unwrap())
        .build()
        .await
        .unwrap();

    let start = Arc::new(Barrier::new(2));
    let sell = move |engine: Engine, start: Arc<Barrier>| {
        tokio::spawn(async move {
            start.wait().await;
            engine.sell_stock(SellStockCmd::new(medicine_id, 6)).await
        })
    };
    let (first, second) = tokio::join!(
        sell(engine.clone(), start.clone()),
        sell(other.clone(), start.clone()),
    );
    let results = [first.unwrap(), second.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    // The loser either saw the decremented stock or was refused the write
    // lock; both roll back.
    assert!(results.iter().all(|r| matches!(
        r,
        Ok(_) | Err(EngineError::InsufficientStock(_) | EngineError::Database(_))
    )));
    assert_eq!(engine.stock_of(medicine_id).await.unwrap(), 4);
    assert_eq!(ledger_rows(&engine).await, (0, 1));

    drop(other);
    drop(engine);
    let _ = std::fs::remove_file(path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_concurrent_sales_keep_the_invariant() {
    let (engine, path) = engine_with_file_db().await;
    let medicine_id = medicine(&engine, "AMX", 25).await;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.sell_stock(SellStockCmd::new(medicine_id, 2)).await })
        })
        .collect();
    let mut sold = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            sold += 2;
        }
    }

    assert_eq!(sold, 24);
    assert_eq!(engine.stock_of(medicine_id).await.unwrap(), 1);
    let sales = engine.list_sales(DateRange::default()).await.unwrap();
    assert_eq!(sales.len(), 12);

    drop(engine);
    let _ = std::fs::remove_file(path);
}

async fn yield_times(n: usize) {
    for _ in 0..n {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn cancelling_at_any_point_keeps_stock_and_rows_in_step() {
    let engine = engine_with_db().await;
    let medicine_id = medicine(&engine, "AMX", 1000).await;

    // Each round drops the sale after a different number of scheduler turns,
    // so the cut lands before, inside and after the transaction.
    let mut completed = 0;
    for turns in 0..64 {
        let sale = engine.sell_stock(SellStockCmd::new(medicine_id, 1));
        tokio::select! {
            biased;
            result = sale => {
                result.unwrap();
                completed += 1;
            }
            () = yield_times(turns) => {}
        }

        let stock = engine.stock_of(medicine_id).await.unwrap();
        let (_, sales) = ledger_rows(&engine).await;
        assert_eq!(stock, 1000 - i64::try_from(sales).unwrap(), "after {turns} turns");
        assert!(sales >= completed);
    }
}
