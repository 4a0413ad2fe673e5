//! Generic tag associations addressed by (kind, id).

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use storehouse_core::EntityKind;
use storehouse_integration_tests::TestContext;
use storehouse_store::ProductRepository;
use storehouse_tags::{ContentRef, TagRepository};

fn labels(items: &[storehouse_tags::TaggedItem]) -> Vec<&str> {
    items.iter().map(|item| item.tag.label.as_str()).collect()
}

#[tokio::test]
async fn test_lookup_matches_kind_and_id() {
    let ctx = TestContext::new().await;
    let games = ctx.collection("Games").await;
    let mut products = Vec::new();
    for title in ["Chess", "Go", "Backgammon"] {
        products.push(ctx.product(games.id, title, "20.00", 5).await);
    }
    let go = &products[1];

    let tags = TagRepository::new(&ctx.pool);
    let strategy = tags.get_or_create_tag("strategy").await.unwrap();
    let classic = tags.get_or_create_tag("classic").await.unwrap();

    let product = ContentRef::new(EntityKind::Product, go.id.as_i32());
    tags.tag(product, strategy.id).await.unwrap();
    tags.tag(product, classic.id).await.unwrap();
    // Same id under a different kind is a different target.
    tags.tag(ContentRef::new(EntityKind::Order, go.id.as_i32()), strategy.id)
        .await
        .unwrap();

    let found = tags.tags_for(product).await.unwrap();
    assert_eq!(labels(&found), vec!["classic", "strategy"]);
    assert!(found.iter().all(|item| item.content == product));

    let order = ContentRef::new(EntityKind::Order, go.id.as_i32());
    assert_eq!(labels(&tags.tags_for(order).await.unwrap()), vec!["strategy"]);

    let chess = ContentRef::new(EntityKind::Product, products[0].id.as_i32());
    assert!(tags.tags_for(chess).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_object_has_no_tags() {
    let ctx = TestContext::new().await;
    let tags = TagRepository::new(&ctx.pool);

    let missing = ContentRef::new(EntityKind::Product, 9_999);
    assert!(tags.tags_for(missing).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_tags_survive_target_deletion_but_no_longer_resolve() {
    let ctx = TestContext::new().await;
    let games = ctx.collection("Games").await;
    let chess = ctx.product(games.id, "Chess", "20.00", 5).await;

    let tagged = ctx
        .site
        .set_product_tags(chess.id, &["classic".to_owned()])
        .await
        .unwrap();
    assert_eq!(labels(&tagged), vec!["classic"]);

    let target = ContentRef::new(EntityKind::Product, chess.id.as_i32());
    let resolved = ctx.site.resolve(target).await.unwrap().unwrap();
    assert_eq!(resolved.label, "Chess");

    ProductRepository::new(&ctx.pool).delete(chess.id).await.unwrap();

    assert!(ctx.site.resolve(target).await.unwrap().is_none());
    let tags = TagRepository::new(&ctx.pool);
    assert_eq!(labels(&tags.tags_for(target).await.unwrap()), vec!["classic"]);
}
