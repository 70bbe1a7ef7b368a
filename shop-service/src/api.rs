use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use shared::*;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: impl Store + 'static) -> Self {
        Self { store: Arc::new(store) }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/:id", get(get_product).delete(delete_product))
        .route("/api/orders", get(list_orders).post(create_order))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Ids that are not UUIDs cannot name a stored product, so they are reported
/// the same way as unknown ones.
fn parse_product_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Product not found".to_string()))
}

pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.store.list_products().await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_product_id(&id)?;

    state
        .store
        .get_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
}

pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let product = state.store.create_product(request).await?;
    tracing::info!(product_id = %product.id, name = %product.name, "Created product");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_product_id(&id)?;

    if state.store.delete_product(id).await? {
        tracing::info!(product_id = %id, "Deleted product");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Product not found".to_string()))
    }
}

pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let order = state.store.create_order(request).await?;
    tracing::info!(
        order_id = %order.id,
        line_items = order.products.len(),
        total_amount = order.total_amount,
        "Created order"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.store.list_orders().await?))
}

pub async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct TestApp {
        store: Arc<MemoryStore>,
        router: Router,
    }

    impl TestApp {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let router = create_router(AppState { store: store.clone() });
            Self { store, router }
        }

        async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            let body = match body {
                Some(value) => {
                    builder = builder.header(header::CONTENT_TYPE, "application/json");
                    Body::from(value.to_string())
                }
                None => Body::empty(),
            };

            let response = self
                .router
                .clone()
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            (status, value)
        }

        async fn create_product(&self, name: &str, price: f64, stock: i32) -> Value {
            let (status, body) = self
                .send(
                    Method::POST,
                    "/api/products",
                    Some(json!({ "name": name, "price": price, "stock": stock })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            body
        }
    }

    #[tokio::test]
    async fn created_product_is_listed_and_fetchable() {
        let app = TestApp::new();
        let created = app.create_product("X", 10.0, 5).await;
        let id = created["id"].as_str().unwrap();

        let (status, listed) = app.send(Method::GET, "/api/products", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, fetched) = app.send(Method::GET, &format!("/api/products/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "X");
        assert_eq!(fetched["stock"], 5);
    }

    #[tokio::test]
    async fn deleted_product_is_not_found() {
        let app = TestApp::new();
        let created = app.create_product("X", 10.0, 5).await;
        let uri = format!("/api/products/{}", created["id"].as_str().unwrap());

        let (status, _) = app.send(Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = app.send(Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Product not found");

        let (status, _) = app.send(Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_product_id_is_not_found() {
        let app = TestApp::new();
        let (status, _) = app.send(Method::GET, "/api/products/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_product_fields_are_rejected() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::POST,
                "/api/products",
                Some(json!({ "name": "X", "price": -1, "stock": 5 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Price must be a non-negative number");

        let (status, _) = app
            .send(Method::POST, "/api/products", Some(json!({ "price": 1, "stock": 5 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, listed) = app.send(Method::GET, "/api/products", None).await;
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_order_is_rejected_without_a_record() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::POST,
                "/api/orders",
                Some(json!({ "products": [], "totalAmount": 0 })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No products in order");
        assert_eq!(app.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn order_keeps_line_items_and_trusts_submitted_total() {
        let app = TestApp::new();
        let first = app.create_product("A", 100.0, 5).await;
        let second = app.create_product("B", 50.0, 5).await;

        let (status, order) = app
            .send(
                Method::POST,
                "/api/orders",
                Some(json!({
                    "products": [
                        { "productId": first["id"], "quantity": 2 },
                        { "productId": second["id"], "quantity": 1 },
                    ],
                    "totalAmount": 225,
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order["products"].as_array().unwrap().len(), 2);
        assert_eq!(order["totalAmount"], 225.0);
        assert_eq!(order["products"][0]["product"]["name"], "A");

        // Stock is not decremented by placing an order.
        let uri = format!("/api/products/{}", first["id"].as_str().unwrap());
        let (_, product) = app.send(Method::GET, &uri, None).await;
        assert_eq!(product["stock"], 5);
    }

    #[tokio::test]
    async fn order_accepts_unknown_products_and_quantities_over_stock() {
        let app = TestApp::new();
        let (status, order) = app
            .send(
                Method::POST,
                "/api/orders",
                Some(json!({
                    "products": [{ "productId": Uuid::new_v4(), "quantity": 99 }],
                    "totalAmount": 1,
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert!(order["products"][0]["product"].is_null());
    }

    #[tokio::test]
    async fn deleting_a_product_leaves_orders_intact() {
        let app = TestApp::new();
        let product = app.create_product("A", 10.0, 3).await;
        app.send(
            Method::POST,
            "/api/orders",
            Some(json!({
                "products": [{ "productId": product["id"], "quantity": 1 }],
                "totalAmount": 9,
            })),
        )
        .await;

        let uri = format!("/api/products/{}", product["id"].as_str().unwrap());
        app.send(Method::DELETE, &uri, None).await;

        let (status, orders) = app.send(Method::GET, "/api/orders", None).await;
        assert_eq!(status, StatusCode::OK);
        let orders = orders.as_array().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0]["products"][0]["productId"], product["id"]);
        assert_eq!(orders[0]["products"][0]["quantity"], 1);
        assert!(orders[0]["products"][0]["product"].is_null());
        assert_eq!(orders[0]["totalAmount"], 9.0);
    }

    #[tokio::test]
    async fn malformed_order_body_is_a_client_error() {
        let app = TestApp::new();
        let (status, body) = app
            .send(Method::POST, "/api/orders", Some(json!({ "totalAmount": 5 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert_eq!(app.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn store_failure_is_reported_generically() {
        let app = TestApp::new();
        app.store.set_fail_next(true).await;

        let (status, body) = app.send(Method::GET, "/api/orders", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn health_check_responds() {
        let app = TestApp::new();
        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
