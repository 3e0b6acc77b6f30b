//! Integration Tests - Executor Against Mocked Ports
//!
//! Tests the interaction between the executor and the port traits.
//! Uses mockall for trait mocking and tokio::test for async tests.

use std::sync::Arc;

use chrono::{Duration, Utc};
use mockall::mock;

use betfair_exec_bot::domain::selection::{
    BetHistoryRecord, ExchangeOrder, MarketSnapshot, MarketType, OrderRequest, OrderStatus,
    Selection, Side, StrategyRef,
};
use betfair_exec_bot::domain::sizing::StakeSizer;
use betfair_exec_bot::ports::exchange::{CashOutResult, PlacementResult};
use betfair_exec_bot::usecases::{CycleActions, CycleSummary, Executor};

// ---- Mock Definitions ----

mock! {
    pub Exchange {}

    #[async_trait::async_trait]
    impl betfair_exec_bot::ports::exchange::ExchangeClient for Exchange {
        async fn list_current_orders(&self) -> anyhow::Result<Vec<ExchangeOrder>>;
        async fn place_order(&self, request: &OrderRequest) -> anyhow::Result<PlacementResult>;
        async fn cancel_order(&self, order: &ExchangeOrder) -> anyhow::Result<()>;
        async fn cash_out_markets(&self, market_ids: &[String]) -> anyhow::Result<Vec<CashOutResult>>;
        async fn is_healthy(&self) -> bool;
    }
}

mock! {
    pub Store {}

    #[async_trait::async_trait]
    impl betfair_exec_bot::ports::store::SelectionStore for Store {
        async fn fetch_active_selections(&self) -> anyhow::Result<Vec<Selection>>;
        async fn upsert_bookkeeping(&self, selection: &Selection) -> anyhow::Result<()>;
        async fn mark_invalidated(
            &self,
            unique_id: &StrategyRef,
            reason: &str,
            at: chrono::DateTime<Utc>,
        ) -> anyhow::Result<()>;
        async fn mark_cashed_out(&self, unique_id: &StrategyRef) -> anyhow::Result<()>;
        async fn is_healthy(&self) -> bool;
    }
}

mock! {
    pub History {}

    #[async_trait::async_trait]
    impl betfair_exec_bot::ports::store::BetHistoryStore for History {
        async fn append(&self, record: &BetHistoryRecord) -> anyhow::Result<()>;
        async fn records_for(&self, strategy_ref: &StrategyRef) -> anyhow::Result<Vec<BetHistoryRecord>>;
        async fn contains_order(&self, order_id: &str) -> anyhow::Result<bool>;
        async fn is_healthy(&self) -> bool;
    }
}

// ---- Fixtures ----

fn order(order_id: &str, status: OrderStatus, age_seconds: i64, size_matched: f64) -> ExchangeOrder {
    ExchangeOrder {
        order_id: order_id.to_string(),
        market_id: "1.1".to_string(),
        selection_id: 42,
        side: Side::Back,
        price_requested: 3.0,
        size_requested: 50.0,
        size_matched,
        average_price_matched: if size_matched > 0.0 { 3.0 } else { 0.0 },
        status,
        placed_at: Utc::now() - Duration::seconds(age_seconds),
        matched_at: None,
        strategy_ref: "sel-1".to_string(),
    }
}

fn selection(id: &str) -> Selection {
    Selection {
        unique_id: id.to_string(),
        race_id: "race-1".to_string(),
        race_time: Utc::now(),
        horse_id: "h-1".to_string(),
        horse_name: "Test Runner".to_string(),
        market_id: "1.1".to_string(),
        selection_id: 42,
        side: Side::Back,
        market_type: MarketType::Win,
        requested_odds: 3.0,
        target_stake: 50.0,
        snapshot: MarketSnapshot {
            best_back_price: 3.0,
            best_back_size: 100.0,
            best_lay_price: 3.05,
            best_lay_size: 100.0,
            runner_count: 8,
            runner_count_at_creation: 8,
            short_priced_runner_removed: false,
            minutes_to_race: 5.0,
        },
        void_requested: false,
        valid: true,
        invalidated_at: None,
        invalidated_reason: None,
        cashed_out: false,
        fully_matched: false,
        size_matched: 0.0,
        average_price_matched: 0.0,
        processed_at: None,
        cash_out_queued: false,
        newly_invalidated: false,
    }
}

fn request(id: &str) -> OrderRequest {
    OrderRequest {
        strategy_ref: id.to_string(),
        market_id: "1.1".to_string(),
        selection_id: 42,
        side: Side::Back,
        price: 3.0,
        size: 50.0,
        cycle_target: 50.0,
    }
}

fn executor(
    exchange: MockExchange,
    store: MockStore,
    history: MockHistory,
) -> Executor<MockExchange, MockStore, MockHistory> {
    Executor::new(
        Arc::new(exchange),
        Arc::new(store),
        Arc::new(history),
        StakeSizer::default(),
        300,
    )
}

// ---- Reconcile ----

#[tokio::test]
async fn test_completed_order_migrated_once() {
    let mut exchange = MockExchange::new();
    exchange
        .expect_list_current_orders()
        .returning(|| Ok(vec![order("bet-1", OrderStatus::ExecutionComplete, 60, 50.0)]));

    let mut history = MockHistory::new();
    history
        .expect_contains_order()
        .withf(|id| id == "bet-1")
        .returning(|_| Ok(false));
    history
        .expect_append()
        .times(1)
        .withf(|r| r.order_id == "bet-1" && r.size_matched == 50.0)
        .returning(|_| Ok(()));

    let executor = executor(exchange, MockStore::new(), history);
    let mut summary = CycleSummary::default();
    let live = executor.reconcile(&mut summary).await.unwrap();

    assert!(live.is_empty());
    assert_eq!(summary.orders_matched, 1);
}

#[tokio::test]
async fn test_already_recorded_order_not_duplicated() {
    let mut exchange = MockExchange::new();
    exchange
        .expect_list_current_orders()
        .returning(|| Ok(vec![order("bet-1", OrderStatus::ExecutionComplete, 60, 50.0)]));

    let mut history = MockHistory::new();
    history.expect_contains_order().returning(|_| Ok(true));
    history.expect_append().times(0);

    let executor = executor(exchange, MockStore::new(), history);
    let mut summary = CycleSummary::default();
    executor.reconcile(&mut summary).await.unwrap();

    assert_eq!(summary.orders_matched, 0);
}

#[tokio::test]
async fn test_completed_unmatched_order_ignored() {
    let mut exchange = MockExchange::new();
    exchange
        .expect_list_current_orders()
        .returning(|| Ok(vec![order("bet-1", OrderStatus::ExecutionComplete, 60, 0.0)]));

    let mut history = MockHistory::new();
    history.expect_contains_order().times(0);
    history.expect_append().times(0);

    let executor = executor(exchange, MockStore::new(), history);
    let mut summary = CycleSummary::default();
    let live = executor.reconcile(&mut summary).await.unwrap();

    assert!(live.is_empty());
    assert_eq!(summary.orders_matched, 0);
}

#[tokio::test]
async fn test_stale_order_cancelled_with_partial_fill_recorded_first() {
    let mut exchange = MockExchange::new();
    exchange
        .expect_list_current_orders()
        .returning(|| Ok(vec![order("bet-1", OrderStatus::Executable, 400, 10.0)]));
    exchange
        .expect_cancel_order()
        .times(1)
        .withf(|o| o.order_id == "bet-1")
        .returning(|_| Ok(()));

    let mut history = MockHistory::new();
    history.expect_contains_order().returning(|_| Ok(false));
    history
        .expect_append()
        .times(1)
        .withf(|r| r.order_id == "bet-1" && r.size_matched == 10.0)
        .returning(|_| Ok(()));

    let executor = executor(exchange, MockStore::new(), history);
    let mut summary = CycleSummary::default();
    let live = executor.reconcile(&mut summary).await.unwrap();

    assert!(live.is_empty());
    assert_eq!(summary.orders_cancelled, 1);
}

#[tokio::test]
async fn test_fresh_order_stays_live() {
    let mut exchange = MockExchange::new();
    exchange
        .expect_list_current_orders()
        .returning(|| Ok(vec![order("bet-1", OrderStatus::Executable, 30, 0.0)]));

    let executor = executor(exchange, MockStore::new(), MockHistory::new());
    let mut summary = CycleSummary::default();
    let live = executor.reconcile(&mut summary).await.unwrap();

    assert_eq!(live.len(), 1);
    assert_eq!(summary.orders_cancelled, 0);
}

#[tokio::test]
async fn test_failed_cancel_keeps_order_live() {
    let mut exchange = MockExchange::new();
    exchange
        .expect_list_current_orders()
        .returning(|| Ok(vec![order("bet-1", OrderStatus::Executable, 400, 0.0)]));
    exchange
        .expect_cancel_order()
        .returning(|_| Err(anyhow::anyhow!("venue busy")));

    let executor = executor(exchange, MockStore::new(), MockHistory::new());
    let mut summary = CycleSummary::default();
    let live = executor.reconcile(&mut summary).await.unwrap();

    assert_eq!(live.len(), 1);
    assert_eq!(summary.orders_failed, 1);
    assert_eq!(summary.orders_cancelled, 0);
}

// ---- Execute ----

#[tokio::test]
async fn test_invalidation_persisted_and_cash_out_batched() {
    let mut exchange = MockExchange::new();
    exchange
        .expect_cash_out_markets()
        .times(1)
        .withf(|ids| ids == ["1.1".to_string()])
        .returning(|ids| {
            Ok(ids
                .iter()
                .map(|id| CashOutResult {
                    market_id: id.clone(),
                    success: true,
                    message: None,
                })
                .collect())
        });

    let mut store = MockStore::new();
    store
        .expect_mark_invalidated()
        .times(1)
        .withf(|id, reason, _| id.as_str() == "sel-1" && reason == "Manual Void")
        .returning(|_, _, _| Ok(()));
    store
        .expect_mark_cashed_out()
        .times(1)
        .withf(|id| id.as_str() == "sel-1")
        .returning(|_| Ok(()));

    let executor = executor(exchange, store, MockHistory::new());

    let mut sel = selection("sel-1");
    sel.valid = false;
    sel.cash_out_queued = true;
    sel.size_matched = 10.0;
    sel.average_price_matched = 3.0;

    let actions = CycleActions {
        orders: vec![],
        cash_out_markets: vec!["1.1".to_string()],
        invalidations: vec![("sel-1".to_string(), "Manual Void".to_string())],
    };

    let mut selections = vec![sel];
    let mut summary = CycleSummary::default();
    executor
        .execute(&actions, &mut selections, &[], &mut summary)
        .await
        .unwrap();

    assert_eq!(summary.invalidations, 1);
    assert_eq!(summary.cash_outs, 1);
    assert!(selections[0].cashed_out);
}

#[tokio::test]
async fn test_placement_skipped_when_live_order_exists() {
    let mut exchange = MockExchange::new();
    exchange.expect_place_order().times(0);

    let executor = executor(exchange, MockStore::new(), MockHistory::new());

    let live = vec![order("bet-1", OrderStatus::Executable, 30, 0.0)];
    let actions = CycleActions {
        orders: vec![request("sel-1")],
        cash_out_markets: vec![],
        invalidations: vec![],
    };

    let mut selections = vec![selection("sel-1")];
    let mut summary = CycleSummary::default();
    executor
        .execute(&actions, &mut selections, &live, &mut summary)
        .await
        .unwrap();

    assert_eq!(summary.orders_placed, 0);
}

#[tokio::test]
async fn test_placement_failure_leaves_bookkeeping_untouched() {
    let mut exchange = MockExchange::new();
    exchange
        .expect_place_order()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("connection reset")));

    let mut store = MockStore::new();
    store.expect_upsert_bookkeeping().times(0);

    let executor = executor(exchange, store, MockHistory::new());

    let actions = CycleActions {
        orders: vec![request("sel-1")],
        cash_out_markets: vec![],
        invalidations: vec![],
    };

    let mut selections = vec![selection("sel-1")];
    let mut summary = CycleSummary::default();
    executor
        .execute(&actions, &mut selections, &[], &mut summary)
        .await
        .unwrap();

    assert_eq!(summary.orders_failed, 1);
    assert_eq!(selections[0].size_matched, 0.0);
}

#[tokio::test]
async fn test_immediate_fill_folded_into_bookkeeping() {
    let mut exchange = MockExchange::new();
    exchange.expect_place_order().times(1).returning(|req| {
        Ok(PlacementResult {
            success: true,
            order_id: Some("bet-9".to_string()),
            size_matched: req.size,
            average_price_matched: req.price,
            message: None,
        })
    });

    let mut store = MockStore::new();
    store
        .expect_upsert_bookkeeping()
        .times(1)
        .withf(|s| s.size_matched == 50.0 && s.fully_matched)
        .returning(|_| Ok(()));

    let executor = executor(exchange, store, MockHistory::new());

    let actions = CycleActions {
        orders: vec![request("sel-1")],
        cash_out_markets: vec![],
        invalidations: vec![],
    };

    let mut selections = vec![selection("sel-1")];
    let mut summary = CycleSummary::default();
    executor
        .execute(&actions, &mut selections, &[], &mut summary)
        .await
        .unwrap();

    assert_eq!(summary.orders_placed, 1);
    assert!(selections[0].fully_matched);
}

#[tokio::test]
async fn test_rejected_placement_counts_as_failed() {
    let mut exchange = MockExchange::new();
    exchange.expect_place_order().times(1).returning(|_| {
        Ok(PlacementResult {
            success: false,
            order_id: None,
            size_matched: 0.0,
            average_price_matched: 0.0,
            message: Some("INVALID_ODDS".to_string()),
        })
    });

    let executor = executor(exchange, MockStore::new(), MockHistory::new());

    let actions = CycleActions {
        orders: vec![request("sel-1")],
        cash_out_markets: vec![],
        invalidations: vec![],
    };

    let mut selections = vec![selection("sel-1")];
    let mut summary = CycleSummary::default();
    executor
        .execute(&actions, &mut selections, &[], &mut summary)
        .await
        .unwrap();

    assert_eq!(summary.orders_failed, 1);
    assert_eq!(summary.orders_placed, 0);
}

// ---- Matched refresh ----

#[tokio::test]
async fn test_matched_refresh_folds_ledger_and_live_orders() {
    let mut history = MockHistory::new();
    history.expect_records_for().returning(|_| {
        let source = order("bet-1", OrderStatus::ExecutionComplete, 600, 20.0);
        Ok(vec![BetHistoryRecord::from_order(&source, Utc::now())])
    });
    history
        .expect_contains_order()
        .withf(|id| id == "bet-2")
        .returning(|_| Ok(false));

    let mut store = MockStore::new();
    store
        .expect_upsert_bookkeeping()
        .times(1)
        .returning(|_| Ok(()));

    let executor = executor(MockExchange::new(), store, history);

    let live = vec![order("bet-2", OrderStatus::Executable, 30, 10.0)];
    let mut selections = vec![selection("sel-1")];
    executor
        .refresh_matched(&mut selections, &live)
        .await
        .unwrap();

    assert_eq!(selections[0].size_matched, 30.0);
    assert!((selections[0].average_price_matched - 3.0).abs() < 1e-9);
    assert!(!selections[0].fully_matched);
}

#[tokio::test]
async fn test_partial_fill_counted_once_when_cancel_fails() {
    let mut exchange = MockExchange::new();
    exchange
        .expect_list_current_orders()
        .returning(|| Ok(vec![order("bet-1", OrderStatus::Executable, 400, 10.0)]));
    exchange
        .expect_cancel_order()
        .returning(|_| Err(anyhow::anyhow!("venue busy")));

    // The fill is migrated before the cancel attempt; once the record
    // exists, the still-live order must not be summed on top of it.
    let mut seq = mockall::Sequence::new();
    let mut history = MockHistory::new();
    history
        .expect_contains_order()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(false));
    history
        .expect_append()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|r| r.order_id == "bet-1" && r.size_matched == 10.0)
        .returning(|_| Ok(()));
    history
        .expect_contains_order()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(true));
    history.expect_records_for().returning(|_| {
        let source = order("bet-1", OrderStatus::Executable, 400, 10.0);
        Ok(vec![BetHistoryRecord::from_order(&source, Utc::now())])
    });

    let mut store = MockStore::new();
    store.expect_upsert_bookkeeping().returning(|_| Ok(()));

    let executor = executor(exchange, store, history);
    let mut summary = CycleSummary::default();
    let live = executor.reconcile(&mut summary).await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(summary.orders_failed, 1);

    let mut selections = vec![selection("sel-1")];
    executor
        .refresh_matched(&mut selections, &live)
        .await
        .unwrap();

    assert_eq!(selections[0].size_matched, 10.0);
    assert!(!selections[0].fully_matched);
}
