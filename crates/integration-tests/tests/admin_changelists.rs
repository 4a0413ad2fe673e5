//! Admin changelists, list edits, bulk actions and reports end to end.

#![allow(clippy::unwrap_used)]

use storehouse_integration_tests::TestContext;
use storehouse_store::admin::ListQuery;
use storehouse_store::{AdminError, AdminModel, ProductRepository, ReportRepository};

#[tokio::test]
async fn test_inventory_status_boundary_is_ten() {
    let ctx = TestContext::new().await;
    let games = ctx.collection("Games").await;
    ctx.product(games.id, "Nine", "5.00", 9).await;
    ctx.product(games.id, "Ten", "5.00", 10).await;

    let page = ctx
        .site
        .changelist(AdminModel::Product, &ListQuery::new())
        .await
        .unwrap();
    assert_eq!(page.column_values("title"), vec!["Nine", "Ten"]);
    assert_eq!(page.column_values("inventory_status"), vec!["Low", "OK"]);

    let low = ctx
        .site
        .changelist(AdminModel::Product, &ListQuery::new().filter("inventory", "low"))
        .await
        .unwrap();
    assert_eq!(low.column_values("title"), vec!["Nine"]);
}

#[tokio::test]
async fn test_sorting_by_inventory_status_orders_by_inventory() {
    let ctx = TestContext::new().await;
    let games = ctx.collection("Games").await;
    ctx.product(games.id, "Plenty", "5.00", 50).await;
    ctx.product(games.id, "Scarce", "5.00", 2).await;
    ctx.product(games.id, "Some", "5.00", 12).await;

    let page = ctx
        .site
        .changelist(AdminModel::Product, &ListQuery::new().sort("inventory_status"))
        .await
        .unwrap();
    assert_eq!(page.column_values("title"), vec!["Scarce", "Some", "Plenty"]);

    let page = ctx
        .site
        .changelist(AdminModel::Product, &ListQuery::new().sort("-inventory_status"))
        .await
        .unwrap();
    assert_eq!(page.column_values("title"), vec!["Plenty", "Some", "Scarce"]);
}

#[tokio::test]
async fn test_orders_count_matches_placed_orders() {
    let ctx = TestContext::new().await;
    let games = ctx.collection("Games").await;
    let chess = ctx.product(games.id, "Chess", "20.00", 50).await;
    let ann = ctx.customer("Ann", "Lee").await;
    let bob = ctx.customer("Bob", "Annis").await;
    ctx.customer("Carla", "Moss").await;
    for _ in 0..3 {
        ctx.order(ann.id, &[(chess.id, 1)]).await;
    }
    ctx.order(bob.id, &[(chess.id, 2)]).await;

    let page = ctx
        .site
        .changelist(AdminModel::Customer, &ListQuery::new())
        .await
        .unwrap();
    assert_eq!(page.column_values("first_name"), vec!["Ann", "Bob", "Carla"]);
    assert_eq!(page.column_values("orders_count"), vec!["3", "1", "0"]);

    let page = ctx
        .site
        .changelist(AdminModel::Customer, &ListQuery::new().sort("-orders_count"))
        .await
        .unwrap();
    assert_eq!(page.column_values("first_name"), vec!["Ann", "Bob", "Carla"]);
}

#[tokio::test]
async fn test_customer_search_matches_inside_names() {
    let ctx = TestContext::new().await;
    ctx.customer("Joanna", "Smith").await;
    ctx.customer("Bob", "Hannah").await;
    ctx.customer("Carla", "Moss").await;

    let page = ctx
        .site
        .changelist(AdminModel::Customer, &ListQuery::new().search("ANNA"))
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.column_values("first_name"), vec!["Bob", "Joanna"]);
}

#[tokio::test]
async fn test_clear_inventory_updates_every_selected_product() {
    let ctx = TestContext::new().await;
    let games = ctx.collection("Games").await;
    let mut ids = Vec::new();
    for (title, inventory) in [("Chess", 8), ("Go", 14), ("Backgammon", 3)] {
        ids.push(ctx.product(games.id, title, "20.00", inventory).await.id.as_i32());
    }
    let untouched = ctx.product(games.id, "Dominoes", "9.00", 30).await;

    let outcome = ctx
        .site
        .run_action(AdminModel::Product, "clear_inventory", &ids)
        .await
        .unwrap();
    assert_eq!(outcome.affected, 3);
    assert_eq!(outcome.message, "3 products were successfully updated.");

    let inventories: Vec<i64> =
        sqlx::query_scalar("SELECT inventory FROM store_product ORDER BY id")
            .fetch_all(&ctx.pool)
            .await
            .unwrap();
    assert_eq!(inventories, vec![0, 0, 0, 30]);

    let dominoes = ProductRepository::new(&ctx.pool)
        .get(untouched.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(dominoes.inventory, 30);
}

#[tokio::test]
async fn test_clear_inventory_handles_a_very_large_selection() {
    let ctx = TestContext::new().await;
    let games = ctx.collection("Games").await;
    let chess = ctx.product(games.id, "Chess", "20.00", 8).await;

    let mut ids: Vec<i32> = (1_000..301_000).collect();
    ids.push(chess.id.as_i32());

    let outcome = ctx
        .site
        .run_action(AdminModel::Product, "clear_inventory", &ids)
        .await
        .unwrap();
    assert_eq!(outcome.affected, 1);

    let chess = ProductRepository::new(&ctx.pool)
        .get(chess.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chess.inventory, 0);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let ctx = TestContext::new().await;
    let games = ctx.collection("Games").await;
    let chess = ctx.product(games.id, "Chess", "20.00", 5).await;

    let result = ctx
        .site
        .changelist(AdminModel::Product, &ListQuery::new().sort("slug"))
        .await;
    assert!(matches!(result, Err(AdminError::UnknownSortKey { .. })));

    let result = ctx
        .site
        .run_action(AdminModel::Product, "discount", &[chess.id.as_i32()])
        .await;
    assert!(matches!(result, Err(AdminError::UnknownAction { .. })));

    let result = ctx
        .site
        .update_editable(AdminModel::Product, chess.id.as_i32(), "title", "Checkers")
        .await;
    assert!(matches!(result, Err(AdminError::NotEditable { .. })));

    let result = ctx
        .site
        .update_editable(AdminModel::Product, chess.id.as_i32(), "inventory", "lots")
        .await;
    assert!(matches!(result, Err(AdminError::InvalidValue { .. })));

    let product = ProductRepository::new(&ctx.pool)
        .get(chess.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.title, "Chess");
    assert_eq!(product.inventory, 5);
}

#[tokio::test]
async fn test_list_edit_returns_the_refreshed_row() {
    let ctx = TestContext::new().await;
    let games = ctx.collection("Games").await;
    let chess = ctx.product(games.id, "Chess", "20.00", 5).await;

    let row = ctx
        .site
        .update_editable(AdminModel::Product, chess.id.as_i32(), "inventory", "25")
        .await
        .unwrap();
    assert_eq!(row.id, chess.id.as_i32());
    assert!(row.cells.contains(&"25".to_owned()));
    assert!(row.cells.contains(&"OK".to_owned()));
}

#[tokio::test]
async fn test_price_summary_reflects_the_catalog() {
    let ctx = TestContext::new().await;
    let games = ctx.collection("Games").await;
    let baking = ctx.collection("Baking").await;
    ctx.product(games.id, "Chess", "20.00", 5).await;
    ctx.product(games.id, "Go", "30.00", 5).await;
    ctx.product(baking.id, "Flour", "4.50", 40).await;

    let reports = ReportRepository::new(&ctx.pool);

    let all = reports.price_summary(None).await.unwrap();
    assert_eq!(all.count, 3);
    assert_eq!(all.min.map(|v| format!("{v:.2}")).as_deref(), Some("4.50"));
    assert_eq!(all.max.map(|v| format!("{v:.2}")).as_deref(), Some("30.00"));
    assert_eq!(format!("{:.2}", all.total), "54.50");

    let games_only = reports.price_summary(Some(games.id)).await.unwrap();
    assert_eq!(games_only.count, 2);
    assert_eq!(
        games_only.average.map(|v| format!("{v:.2}")).as_deref(),
        Some("25.00")
    );
}
