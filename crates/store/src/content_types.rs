//! Store entities as tagging targets.
//!
//! Registers every store table with the tags crate so a
//! [`ContentRef`](storehouse_tags::ContentRef) can be resolved back to a
//! label, and implements [`Taggable`] for the store models.

use storehouse_core::EntityKind;
use storehouse_tags::{ContentTypeInfo, ContentTypeRegistry, Taggable};

use crate::models::{
    Address, Cart, CartItem, Collection, Customer, Order, OrderItem, Product, Promotion,
};

/// Registry covering every store entity kind.
#[must_use]
pub fn registry() -> ContentTypeRegistry {
    ContentTypeRegistry::new()
        .register(
            EntityKind::Collection,
            ContentTypeInfo::new("store_collection", "title"),
        )
        .register(
            EntityKind::Product,
            ContentTypeInfo::new("store_product", "title"),
        )
        .register(
            EntityKind::Promotion,
            ContentTypeInfo::new("store_promotion", "description"),
        )
        .register(
            EntityKind::Customer,
            ContentTypeInfo::new("store_customer", "first_name || ' ' || last_name"),
        )
        .register(
            EntityKind::Order,
            ContentTypeInfo::new("store_order", "'Order #' || id"),
        )
        .register(
            EntityKind::OrderItem,
            ContentTypeInfo::new("store_orderitem", "'Order item #' || id"),
        )
        .register(
            EntityKind::Address,
            ContentTypeInfo::new("store_address", "street || ', ' || city"),
        )
        .register(
            EntityKind::Cart,
            ContentTypeInfo::new("store_cart", "'Cart #' || id"),
        )
        .register(
            EntityKind::CartItem,
            ContentTypeInfo::new("store_cartitem", "'Cart item #' || id"),
        )
}

macro_rules! impl_taggable {
    ($($model:ty => $kind:ident),+ $(,)?) => {
        $(
            impl Taggable for $model {
                const KIND: EntityKind = EntityKind::$kind;

                fn object_id(&self) -> i32 {
                    self.id.as_i32()
                }
            }
        )+
    };
}

impl_taggable! {
    Collection => Collection,
    Product => Product,
    Promotion => Promotion,
    Customer => Customer,
    Order => Order,
    OrderItem => OrderItem,
    Address => Address,
    Cart => Cart,
    CartItem => CartItem,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storehouse_core::{Email, Membership};
    use storehouse_tags::{ContentRef, TagRepository};

    use super::*;
    use crate::db::test_support;
    use crate::db::{CollectionRepository, CustomerRepository};
    use crate::models::{CreateCollectionInput, CreateCustomerInput};

    #[test]
    fn test_registry_covers_every_kind() {
        assert_eq!(registry().kinds(), EntityKind::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_resolve_store_rows() {
        let pool = test_support::pool().await;
        let collection = CollectionRepository::new(&pool)
            .create(&CreateCollectionInput {
                title: "Games".to_owned(),
                featured_product_id: None,
            })
            .await
            .unwrap();
        let customer = CustomerRepository::new(&pool)
            .create(&CreateCustomerInput {
                first_name: "Ann".to_owned(),
                last_name: "Lee".to_owned(),
                email: Email::parse("ann@example.com").unwrap(),
                phone: "1".to_owned(),
                birth_date: None,
                membership: Membership::Bronze,
            })
            .await
            .unwrap();

        let registry = registry();
        let tags = TagRepository::new(&pool);

        let found = tags
            .resolve(&registry, collection.content_ref())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.label, "Games");

        let found = tags
            .resolve(&registry, customer.content_ref())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.label, "Ann Lee");

        assert!(
            tags.resolve(&registry, ContentRef::new(EntityKind::Order, 1))
                .await
                .unwrap()
                .is_none()
        );
    }
}
