//! `PostgreSQL` store tests.
//!
//! These tests require:
//! - A reachable `PostgreSQL` database in `TEST_DATABASE_URL`
//!
//! The `shop` schema in that database is dropped and recreated. The checks
//! run sequentially inside one test so they never race on the schema.
//!
//! Run with: `cargo test -p ecommerce-integration-tests -- --ignored`

use ecommerce_api::db::{
    self, MaintenanceStore, OrderStore, PgStore, ProductStore, RepositoryError, UserStore,
};
use ecommerce_api::models::Resource;
use ecommerce_core::{NewOrder, NewProduct, NewUser, OrderChanges, OrderId, Price, ProductId, UserId};
use ecommerce_integration_tests::{TestServer, json_body};
use reqwest::StatusCode;
use secrecy::SecretString;
use serde_json::json;

async fn fresh_store() -> PgStore {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to test database");
    let store = PgStore::new(pool);
    store.reset().await.expect("Failed to reset schema");
    store
}

fn new_user(name: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        address: "1 Main St".to_string(),
        email: format!("{name}@example.com"),
    }
}

fn new_product(name: &str, price: &str) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        price: Price::parse(price).expect("valid price"),
    }
}

async fn check_user_lifecycle(store: &PgStore) {
    let user = store.create_user(&new_user("a")).await.unwrap();
    assert_eq!(user.id, UserId::new(1));
    assert_eq!(store.get_user(user.id).await.unwrap(), Some(user.clone()));

    let updated = store
        .update_user(user.id, &new_user("b"))
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(updated.name, "b");
    assert!(
        store
            .update_user(UserId::new(99), &new_user("c"))
            .await
            .unwrap()
            .is_none()
    );

    assert!(store.delete_user(user.id).await.unwrap());
    assert!(store.get_user(user.id).await.unwrap().is_none());
    assert!(!store.delete_user(user.id).await.unwrap());
}

async fn check_product_prices_round_trip(store: &PgStore) {
    let product = store
        .create_product(&new_product("P", "9.99"))
        .await
        .unwrap();
    let fetched = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(fetched.price, Price::parse("9.99").unwrap());
    assert_eq!(store.list_products().await.unwrap(), vec![fetched]);
}

async fn check_orders_and_associations(store: &PgStore) {
    let err = store
        .create_order(&NewOrder {
            user_id: UserId::new(404),
            order_date: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::ForeignKey {
            resource: Resource::User,
            id: 404
        }
    ));
    assert!(store.list_orders().await.unwrap().is_empty());

    let user = store.create_user(&new_user("owner")).await.unwrap();
    let order = store
        .create_order(&NewOrder {
            user_id: user.id,
            order_date: None,
        })
        .await
        .unwrap();
    let p1 = store.create_product(&new_product("A", "1")).await.unwrap();
    let p2 = store.create_product(&new_product("B", "2.50")).await.unwrap();

    store.add_product_to_order(order.id, p2.id).await.unwrap();
    store.add_product_to_order(order.id, p1.id).await.unwrap();
    assert!(matches!(
        store.add_product_to_order(order.id, p1.id).await,
        Err(RepositoryError::AlreadyAssociated { .. })
    ));
    assert!(matches!(
        store
            .add_product_to_order(OrderId::new(999), p1.id)
            .await,
        Err(RepositoryError::NotFound {
            resource: Resource::Order,
            ..
        })
    ));
    assert!(matches!(
        store
            .add_product_to_order(order.id, ProductId::new(999))
            .await,
        Err(RepositoryError::NotFound {
            resource: Resource::Product,
            ..
        })
    ));

    let products = store
        .list_products_for_order(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(products, vec![p1.clone(), p2.clone()]);

    store
        .remove_product_from_order(order.id, p1.id)
        .await
        .unwrap();
    assert!(matches!(
        store.remove_product_from_order(order.id, p1.id).await,
        Err(RepositoryError::NotAssociated { .. })
    ));

    let changes = OrderChanges {
        order_date: ecommerce_core::validation::parse_timestamp("2024-01-02T03:04:05Z").unwrap(),
    };
    let moved = store
        .update_order(order.id, &changes)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.order_date, changes.order_date);
    assert_eq!(moved.user_id, user.id);

    assert_eq!(
        store.list_orders_for_user(user.id).await.unwrap(),
        Some(vec![moved])
    );
    assert!(
        store
            .list_orders_for_user(UserId::new(999))
            .await
            .unwrap()
            .is_none()
    );

    assert!(matches!(
        store.delete_user(user.id).await,
        Err(RepositoryError::ConstraintViolation(_))
    ));

    assert!(store.delete_product(p2.id).await.unwrap());
    assert!(
        store
            .list_products_for_order(order.id)
            .await
            .unwrap()
            .unwrap()
            .is_empty()
    );

    assert!(store.delete_order(order.id).await.unwrap());
    assert!(store.delete_user(user.id).await.unwrap());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL in TEST_DATABASE_URL"]
async fn test_postgres_store_semantics() {
    let store = fresh_store().await;
    store.ping().await.unwrap();

    check_user_lifecycle(&store).await;
    check_product_prices_round_trip(&store).await;
    check_orders_and_associations(&store).await;

    store.reset().await.unwrap();
    check_worked_example_over_http(store).await;
}

async fn check_worked_example_over_http(store: PgStore) {
    let srv = TestServer::spawn(store, false).await;

    let res = srv
        .post(
            "/users",
            &json!({"name": "A", "address": "X", "email": "a@x.com"}),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(json_body(res).await["id"], 1);

    let res = srv.post("/orders", &json!({"user_id": 1})).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = srv
        .post("/products", &json!({"name": "P", "price": 9.99}))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    assert_eq!(
        srv.put_empty("/orders/1/add_product/1").await.status(),
        StatusCode::OK
    );
    assert_eq!(
        json_body(srv.get("/orders/1/products").await).await,
        json!([{"id": 1, "name": "P", "price": 9.99}])
    );
    assert_eq!(srv.get("/health/ready").await.status(), StatusCode::OK);
}
