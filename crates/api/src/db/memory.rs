//! In-memory store for tests and database-free local runs.
//!
//! All tables sit behind one `RwLock`, so every operation observes and
//! leaves a consistent snapshot. Semantics follow [`super::PgStore`]:
//! deleting a user with orders is refused, deleting a product or an order
//! drops its association rows, and `reset` restarts identifiers at 1.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use ecommerce_core::{NewOrder, NewProduct, NewUser, OrderChanges, OrderId, ProductId, UserId};

use super::{MaintenanceStore, OrderStore, ProductStore, RepositoryError, UserStore};
use crate::models::{Order, Product, Resource, User};

#[derive(Debug)]
struct Tables {
    users: BTreeMap<UserId, User>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
    order_products: BTreeSet<(OrderId, ProductId)>,
    next_user_id: i32,
    next_product_id: i32,
    next_order_id: i32,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            products: BTreeMap::new(),
            orders: BTreeMap::new(),
            order_products: BTreeSet::new(),
            next_user_id: 1,
            next_product_id: 1,
            next_order_id: 1,
        }
    }
}

impl Tables {
    fn ensure_pair_exists(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        if !self.orders.contains_key(&order_id) {
            return Err(RepositoryError::NotFound {
                resource: Resource::Order,
                id: order_id.as_i32(),
            });
        }
        if !self.products.contains_key(&product_id) {
            return Err(RepositoryError::NotFound {
                resource: Resource::Product,
                id: product_id.as_i32(),
            });
        }
        Ok(())
    }
}

/// Take the next value of a sequence.
fn next_id(counter: &mut i32) -> Result<i32, RepositoryError> {
    let id = *counter;
    *counter = id
        .checked_add(1)
        .ok_or_else(|| RepositoryError::DataCorruption("identifier sequence exhausted".into()))?;
    Ok(id)
}

/// Store that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, input: &NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        let id = UserId::new(next_id(&mut tables.next_user_id)?);
        let user = User::from_input(id, input);
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().cloned().collect())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn update_user(
        &self,
        id: UserId,
        input: &NewUser,
    ) -> Result<Option<User>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            *user = User::from_input(id, input);
            user.clone()
        }))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Ok(false);
        }
        if tables.orders.values().any(|order| order.user_id == id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "User {id} still has orders"
            )));
        }
        tables.users.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn create_product(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;
        let id = ProductId::new(next_id(&mut tables.next_product_id)?);
        let product = Product::from_input(id, input);
        tables.products.insert(id, product.clone());
        Ok(product)
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.products.values().cloned().collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.products.get(&id).cloned())
    }

    async fn update_product(
        &self,
        id: ProductId,
        input: &NewProduct,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.products.get_mut(&id).map(|product| {
            *product = Product::from_input(id, input);
            product.clone()
        }))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.products.remove(&id).is_none() {
            return Ok(false);
        }
        tables.order_products.retain(|&(_, product_id)| product_id != id);
        Ok(true)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self, input: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&input.user_id) {
            return Err(RepositoryError::ForeignKey {
                resource: Resource::User,
                id: input.user_id.as_i32(),
            });
        }

        let id = OrderId::new(next_id(&mut tables.next_order_id)?);
        let order = Order {
            id,
            order_date: input.order_date.unwrap_or_else(Utc::now),
            user_id: input.user_id,
        };
        tables.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.orders.values().cloned().collect())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.orders.get(&id).cloned())
    }

    async fn update_order(
        &self,
        id: OrderId,
        changes: &OrderChanges,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.orders.get_mut(&id).map(|order| {
            order.order_date = changes.order_date;
            order.clone()
        }))
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.orders.remove(&id).is_none() {
            return Ok(false);
        }
        tables.order_products.retain(|&(order_id, _)| order_id != id);
        Ok(true)
    }

    async fn add_product_to_order(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.ensure_pair_exists(order_id, product_id)?;

        if !tables.order_products.insert((order_id, product_id)) {
            return Err(RepositoryError::AlreadyAssociated {
                order_id,
                product_id,
            });
        }
        Ok(())
    }

    async fn remove_product_from_order(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.ensure_pair_exists(order_id, product_id)?;

        if !tables.order_products.remove(&(order_id, product_id)) {
            return Err(RepositoryError::NotAssociated {
                order_id,
                product_id,
            });
        }
        Ok(())
    }

    async fn list_orders_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Vec<Order>>, RepositoryError> {
        let tables = self.tables.read().await;
        if !tables.users.contains_key(&user_id) {
            return Ok(None);
        }

        Ok(Some(
            tables
                .orders
                .values()
                .filter(|order| order.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_products_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Vec<Product>>, RepositoryError> {
        let tables = self.tables.read().await;
        if !tables.orders.contains_key(&order_id) {
            return Ok(None);
        }

        // The set is ordered by (order, product), so this range is ordered by product ID.
        let products = tables
            .order_products
            .range((order_id, ProductId::new(i32::MIN))..=(order_id, ProductId::new(i32::MAX)))
            .filter_map(|(_, product_id)| tables.products.get(product_id).cloned())
            .collect();
        Ok(Some(products))
    }
}

#[async_trait]
impl MaintenanceStore for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn reset(&self) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        *tables = Tables::default();
        tracing::warn!("in-memory store cleared");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ecommerce_core::Price;

    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            name: name.to_owned(),
            address: "1 Main St".to_owned(),
            email: format!("{name}@example.com"),
        }
    }

    fn new_product(name: &str, price: &str) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            price: Price::parse(price).unwrap(),
        }
    }

    fn new_order(user_id: UserId) -> NewOrder {
        NewOrder {
            user_id,
            order_date: None,
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential_per_table() {
        let store = MemoryStore::new();
        let a = store.create_user(&new_user("a")).await.unwrap();
        let b = store.create_user(&new_user("b")).await.unwrap();
        let p = store.create_product(&new_product("p", "1")).await.unwrap();

        assert_eq!(a.id, UserId::new(1));
        assert_eq!(b.id, UserId::new(2));
        assert_eq!(p.id, ProductId::new(1));
    }

    #[tokio::test]
    async fn test_update_keeps_id() {
        let store = MemoryStore::new();
        let user = store.create_user(&new_user("a")).await.unwrap();

        let updated = store
            .update_user(user.id, &new_user("b"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, user.id);
        assert_eq!(updated.name, "b");

        let missing = store
            .update_user(UserId::new(42), &new_user("c"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_create_order_requires_existing_user() {
        let store = MemoryStore::new();
        let err = store.create_order(&new_order(UserId::new(7))).await;

        assert!(matches!(
            err,
            Err(RepositoryError::ForeignKey {
                resource: Resource::User,
                id: 7
            })
        ));
        assert!(store.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_order_uses_supplied_date() {
        let store = MemoryStore::new();
        let user = store.create_user(&new_user("a")).await.unwrap();
        let date = ecommerce_core::validation::parse_timestamp("2024-05-01T12:00:00Z").unwrap();

        let order = store
            .create_order(&NewOrder {
                user_id: user.id,
                order_date: Some(date),
            })
            .await
            .unwrap();
        assert_eq!(order.order_date, date);
    }

    #[tokio::test]
    async fn test_delete_user_with_orders_is_restricted() {
        let store = MemoryStore::new();
        let user = store.create_user(&new_user("a")).await.unwrap();
        let order = store.create_order(&new_order(user.id)).await.unwrap();

        let err = store.delete_user(user.id).await;
        assert!(matches!(err, Err(RepositoryError::ConstraintViolation(_))));
        assert!(store.get_user(user.id).await.unwrap().is_some());

        assert!(store.delete_order(order.id).await.unwrap());
        assert!(store.delete_user(user.id).await.unwrap());
        assert!(!store.delete_user(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_association_is_a_set() {
        let store = MemoryStore::new();
        let user = store.create_user(&new_user("a")).await.unwrap();
        let order = store.create_order(&new_order(user.id)).await.unwrap();
        let product = store.create_product(&new_product("p", "9.99")).await.unwrap();

        store
            .add_product_to_order(order.id, product.id)
            .await
            .unwrap();
        let again = store.add_product_to_order(order.id, product.id).await;
        assert!(matches!(
            again,
            Err(RepositoryError::AlreadyAssociated { .. })
        ));

        let products = store
            .list_products_for_order(order.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(products, vec![product]);
    }

    #[tokio::test]
    async fn test_remove_missing_association() {
        let store = MemoryStore::new();
        let user = store.create_user(&new_user("a")).await.unwrap();
        let order = store.create_order(&new_order(user.id)).await.unwrap();
        let product = store.create_product(&new_product("p", "1")).await.unwrap();

        let err = store.remove_product_from_order(order.id, product.id).await;
        assert!(matches!(err, Err(RepositoryError::NotAssociated { .. })));
    }

    #[tokio::test]
    async fn test_association_checks_order_before_product() {
        let store = MemoryStore::new();
        let err = store
            .add_product_to_order(OrderId::new(1), ProductId::new(1))
            .await;

        assert!(matches!(
            err,
            Err(RepositoryError::NotFound {
                resource: Resource::Order,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_deletes_cascade_to_associations() {
        let store = MemoryStore::new();
        let user = store.create_user(&new_user("a")).await.unwrap();
        let first = store.create_order(&new_order(user.id)).await.unwrap();
        let second = store.create_order(&new_order(user.id)).await.unwrap();
        let p1 = store.create_product(&new_product("p1", "1")).await.unwrap();
        let p2 = store.create_product(&new_product("p2", "2")).await.unwrap();

        for (order, product) in [(first.id, p1.id), (first.id, p2.id), (second.id, p1.id)] {
            store.add_product_to_order(order, product).await.unwrap();
        }

        assert!(store.delete_product(p1.id).await.unwrap());
        let remaining = store
            .list_products_for_order(first.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(remaining, vec![p2.clone()]);
        assert!(
            store
                .list_products_for_order(second.id)
                .await
                .unwrap()
                .unwrap()
                .is_empty()
        );

        assert!(store.delete_order(first.id).await.unwrap());
        assert!(store.list_products_for_order(first.id).await.unwrap().is_none());

        // The product survives its order being deleted.
        assert!(store.get_product(p2.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_orders_for_user() {
        let store = MemoryStore::new();
        let a = store.create_user(&new_user("a")).await.unwrap();
        let b = store.create_user(&new_user("b")).await.unwrap();
        let o1 = store.create_order(&new_order(a.id)).await.unwrap();
        store.create_order(&new_order(b.id)).await.unwrap();
        let o3 = store.create_order(&new_order(a.id)).await.unwrap();

        let orders = store.list_orders_for_user(a.id).await.unwrap().unwrap();
        assert_eq!(orders, vec![o1, o3]);
        assert!(
            store
                .list_orders_for_user(UserId::new(99))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_reset_restarts_ids() {
        let store = MemoryStore::new();
        store.create_user(&new_user("a")).await.unwrap();
        store.create_user(&new_user("b")).await.unwrap();

        store.reset().await.unwrap();
        assert!(store.list_users().await.unwrap().is_empty());

        let user = store.create_user(&new_user("c")).await.unwrap();
        assert_eq!(user.id, UserId::new(1));
    }
}
