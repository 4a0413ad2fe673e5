//! Referential actions and constraints across the store schema.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use storehouse_integration_tests::TestContext;
use storehouse_store::models::{CreateAddressInput, CreateCustomerInput};
use storehouse_store::{
    AddressRepository, CollectionRepository, CustomerRepository, OrderRepository,
    ProductRepository, RepositoryError,
};

#[tokio::test]
async fn test_deleting_featured_product_clears_the_reference() {
    let ctx = TestContext::new().await;
    let games = ctx.collection("Games").await;
    let chess = ctx.product(games.id, "Chess", "20.00", 5).await;

    let collections = CollectionRepository::new(&ctx.pool);
    collections
        .set_featured_product(games.id, Some(chess.id))
        .await
        .unwrap();

    assert!(ProductRepository::new(&ctx.pool).delete(chess.id).await.unwrap());

    let games = collections.get(games.id).await.unwrap().unwrap();
    assert_eq!(games.featured_product_id, None);
}

#[tokio::test]
async fn test_collection_with_products_cannot_be_deleted() {
    let ctx = TestContext::new().await;
    let games = ctx.collection("Games").await;
    ctx.product(games.id, "Chess", "20.00", 5).await;

    let result = CollectionRepository::new(&ctx.pool).delete(games.id).await;
    assert!(matches!(result, Err(RepositoryError::Protected(_))));
    assert_eq!(ctx.count("store_collection").await, 1);
}

#[tokio::test]
async fn test_customer_with_orders_cannot_be_deleted() {
    let ctx = TestContext::new().await;
    let games = ctx.collection("Games").await;
    let chess = ctx.product(games.id, "Chess", "20.00", 5).await;
    let ann = ctx.customer("Ann", "Lee").await;
    ctx.order(ann.id, &[(chess.id, 1)]).await;
    AddressRepository::new(&ctx.pool)
        .create(&CreateAddressInput {
            street: "1 High Street".to_owned(),
            city: "Portsmouth".to_owned(),
            zip_code: None,
            customer_id: ann.id,
        })
        .await
        .unwrap();

    let customers = CustomerRepository::new(&ctx.pool);
    let result = customers.delete(ann.id).await;
    assert!(matches!(result, Err(RepositoryError::Protected(_))));

    assert_eq!(customers.get(ann.id).await.unwrap(), Some(ann));
    assert_eq!(ctx.count("store_customer").await, 1);
    assert_eq!(ctx.count("store_order").await, 1);
    assert_eq!(ctx.count("store_orderitem").await, 1);
    assert_eq!(ctx.count("store_address").await, 1);
}

#[tokio::test]
async fn test_ordered_product_cannot_be_deleted() {
    let ctx = TestContext::new().await;
    let games = ctx.collection("Games").await;
    let chess = ctx.product(games.id, "Chess", "20.00", 5).await;
    let ann = ctx.customer("Ann", "Lee").await;
    ctx.order(ann.id, &[(chess.id, 1)]).await;

    let result = ProductRepository::new(&ctx.pool).delete(chess.id).await;
    assert!(matches!(result, Err(RepositoryError::Protected(_))));
}

#[tokio::test]
async fn test_deleting_customer_removes_their_addresses() {
    let ctx = TestContext::new().await;
    let ann = ctx.customer("Ann", "Lee").await;
    let addresses = AddressRepository::new(&ctx.pool);
    for street in ["1 High Street", "2 Low Road"] {
        addresses
            .create(&CreateAddressInput {
                street: street.to_owned(),
                city: "Portsmouth".to_owned(),
                zip_code: None,
                customer_id: ann.id,
            })
            .await
            .unwrap();
    }
    assert_eq!(ctx.count("store_address").await, 2);

    assert!(CustomerRepository::new(&ctx.pool).delete(ann.id).await.unwrap());
    assert_eq!(ctx.count("store_address").await, 0);
}

#[tokio::test]
async fn test_duplicate_email_is_a_conflict() {
    let ctx = TestContext::new().await;
    let ann = ctx.customer("Ann", "Lee").await;

    let result = CustomerRepository::new(&ctx.pool)
        .create(&CreateCustomerInput {
            first_name: "Annie".to_owned(),
            last_name: "Leigh".to_owned(),
            email: ann.email.clone(),
            phone: "555-0199".to_owned(),
            birth_date: None,
            membership: ann.membership,
        })
        .await;

    assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    assert_eq!(ctx.count("store_customer").await, 1);
}

#[tokio::test]
async fn test_order_items_keep_the_price_they_were_sold_at() {
    let ctx = TestContext::new().await;
    let games = ctx.collection("Games").await;
    let chess = ctx.product(games.id, "Chess", "20.00", 5).await;
    let ann = ctx.customer("Ann", "Lee").await;
    let order = ctx.order(ann.id, &[(chess.id, 2)]).await;

    ProductRepository::new(&ctx.pool)
        .set_unit_price(chess.id, "35.50".parse().unwrap())
        .await
        .unwrap();

    let detail = OrderRepository::new(&ctx.pool)
        .get_detail(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.lines.len(), 1);
    assert_eq!(detail.lines[0].item.unit_price.to_string(), "20.00");
    assert_eq!(detail.lines[0].product.unit_price.to_string(), "35.50");
    assert_eq!(format!("{:.2}", detail.total()), "40.00");
}
