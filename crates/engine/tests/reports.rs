use chrono::{Days, Utc};

use engine::{
    DateRange, Engine, EngineError, FinancialPeriod, MoneyCents, NewMedicine, ReceiveStockCmd,
    SellStockCmd, SortOrder, TopSellingQuery, TopSellingSort, database,
};
use migration::MigratorTrait;

async fn engine_with_db() -> Engine {
    let db = database::open("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

/// Two medicines with some stock movements:
/// - AMX price 12.50, received 10 @ 4.00 and 10 @ 6.00, sold 5
/// - IBU price 3.00, received 100 @ 1.00, sold 20
async fn seeded() -> (Engine, i64, i64) {
    let engine = engine_with_db().await;
    let amx = engine
        .create_medicine(NewMedicine::new("AMX", "Amoxicillin", "capsule", MoneyCents::new(1250)))
        .await
        .unwrap()
        .id;
    let ibu = engine
        .create_medicine(NewMedicine::new("IBU", "Ibuprofen", "tablet", MoneyCents::new(300)))
        .await
        .unwrap()
        .id;

    for (medicine_id, quantity, price) in [(amx, 10, 400), (amx, 10, 600), (ibu, 100, 100)] {
        engine
            .receive_stock(ReceiveStockCmd::new(medicine_id, quantity, MoneyCents::new(price)))
            .await
            .unwrap();
    }
    engine
        .sell_stock(SellStockCmd::new(amx, 5))
        .await
        .unwrap();
    engine
        .sell_stock(SellStockCmd::new(ibu, 20))
        .await
        .unwrap();
    (engine, amx, ibu)
}

#[tokio::test]
async fn dashboard_counts_stock_sales_and_low_stock() {
    let (engine, _, _) = seeded().await;

    let stats = engine.dashboard_stats(Utc::now()).await.unwrap();

    assert_eq!(stats.total_stock, 15 + 80);
    assert_eq!(stats.month_sales, MoneyCents::new(5 * 1250 + 20 * 300));
    // AMX has 15 left
    assert_eq!(stats.low_stock, 1);
}

#[tokio::test]
async fn inbound_and_sales_reports_sum_their_rows() {
    let (engine, _, _) = seeded().await;

    let inbound = engine.inbound_report(DateRange::default()).await.unwrap();
    assert_eq!(inbound.records.len(), 3);
    assert_eq!(inbound.total_quantity, 120);
    assert_eq!(inbound.total_amount, MoneyCents::new(4000 + 6000 + 10000));

    let sales = engine.sales_report(DateRange::default()).await.unwrap();
    assert_eq!(sales.records.len(), 2);
    assert_eq!(sales.total_quantity, 25);
    assert_eq!(sales.total_amount, MoneyCents::new(6250 + 6000));
    // newest first
    assert!(sales.records[0].record.id > sales.records[1].record.id);
}

#[tokio::test]
async fn date_range_filters_reports() {
    let (engine, _, _) = seeded().await;
    let today = Utc::now().date_naive();
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap();
    let last_week = today.checked_sub_days(Days::new(7)).unwrap();

    let today_only = DateRange::new(Some(today), Some(today));
    assert_eq!(engine.sales_report(today_only).await.unwrap().records.len(), 2);

    let future = DateRange::new(Some(tomorrow), None);
    assert!(engine.inbound_report(future).await.unwrap().records.is_empty());

    let past = DateRange::new(Some(last_week), Some(last_week));
    assert_eq!(engine.sales_report(past).await.unwrap().total_quantity, 0);

    let reversed = DateRange::new(Some(tomorrow), Some(today));
    assert!(matches!(
        engine.sales_report(reversed).await,
        Err(EngineError::InvalidAmount(_))
    ));
}

#[tokio::test]
async fn inventory_report_orders_by_stock() {
    let (engine, amx, ibu) = seeded().await;
    let empty = engine
        .create_medicine(NewMedicine::new("VTC", "Vitamin C", "tablet", MoneyCents::new(50)))
        .await
        .unwrap()
        .id;

    let report = engine.inventory_report().await.unwrap();

    let order: Vec<i64> = report.medicines.iter().map(|m| m.id).collect();
    assert_eq!(order, vec![empty, amx, ibu]);
    assert_eq!(report.total_stock, 95);
    assert_eq!(report.total_value, MoneyCents::new(15 * 1250 + 80 * 300));
    assert_eq!(report.out_of_stock_items.len(), 1);
    assert_eq!(report.low_stock_items.len(), 1);
}

#[tokio::test]
async fn financial_report_uses_average_inbound_cost() {
    let (engine, _, _) = seeded().await;

    let report = engine
        .financial_report(FinancialPeriod::Monthly, Utc::now())
        .await
        .unwrap();

    assert_eq!(report.report_type, FinancialPeriod::Monthly);
    assert_eq!(report.sales_income, MoneyCents::new(12250));
    assert_eq!(report.purchase_cost, MoneyCents::new(20000));
    // COGS: AMX 5 x 5.00 + IBU 20 x 1.00
    assert_eq!(report.gross_profit, MoneyCents::new(12250 - 2500 - 2000));
    assert_eq!(report.sales_count, 2);
    assert_eq!(report.purchase_count, 3);

    let daily = engine
        .financial_report(FinancialPeriod::Daily, Utc::now())
        .await
        .unwrap();
    assert_eq!(daily.sales_count, 2);
}

#[tokio::test]
async fn trend_has_one_point_per_day() {
    let (engine, _, _) = seeded().await;
    let today = Utc::now().date_naive();

    let trend = engine.sales_trend(DateRange::default(), today).await.unwrap();

    assert_eq!(trend.len(), 30);
    let last = trend.last().unwrap();
    assert_eq!(last.sale_day, today);
    assert_eq!(last.order_count, 2);
    assert_eq!(last.total_quantity, 25);
    assert_eq!(last.total_revenue, MoneyCents::new(12250));
    assert_eq!(last.total_profit, MoneyCents::new(12250 - 4500));
    assert!(trend[..29].iter().all(|p| p.order_count == 0));
}

#[tokio::test]
async fn top_selling_ranks_by_requested_column() {
    let (engine, amx, ibu) = seeded().await;
    let today = Utc::now().date_naive();

    let by_sold = engine
        .top_selling(TopSellingQuery::default(), today)
        .await
        .unwrap();
    assert_eq!(by_sold.iter().map(|s| s.medicine_id).collect::<Vec<_>>(), vec![ibu, amx]);
    assert_eq!(by_sold[0].total_sold, 20);
    assert_eq!(by_sold[0].medicine_name, "Ibuprofen");

    let by_profit = engine
        .top_selling(
            TopSellingQuery {
                sort_by: TopSellingSort::TotalProfit,
                order: SortOrder::Desc,
                limit: 1,
                ..TopSellingQuery::default()
            },
            today,
        )
        .await
        .unwrap();
    assert_eq!(by_profit.len(), 1);
    assert_eq!(by_profit[0].medicine_id, ibu);
    assert_eq!(by_profit[0].total_profit, MoneyCents::new(6000 - 2000));

    let least_profit = engine
        .top_selling(
            TopSellingQuery {
                sort_by: TopSellingSort::TotalProfit,
                order: SortOrder::Asc,
                limit: 1,
                ..TopSellingQuery::default()
            },
            today,
        )
        .await
        .unwrap();
    assert_eq!(least_profit[0].medicine_id, amx);
    assert_eq!(least_profit[0].total_profit, MoneyCents::new(6250 - 2500));
}
