//! Client side of the shop HTTP API.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use shared::*;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server responded with {status}: {message}")]
    Status { status: u16, message: String },
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Operations the storefront and admin views need from the backend.
#[async_trait]
pub trait ShopApi: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, ClientError>;

    /// `Ok(None)` when the server reports the product as not found.
    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, ClientError>;

    async fn create_product(&self, request: &CreateProductRequest) -> Result<Product, ClientError>;

    async fn delete_product(&self, id: Uuid) -> Result<(), ClientError>;

    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, ClientError>;

    async fn list_orders(&self) -> Result<Vec<Order>, ClientError>;
}

pub struct HttpShopApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpShopApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);
    Err(ClientError::Status { status: status.as_u16(), message })
}

#[async_trait]
impl ShopApi for HttpShopApi {
    async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
        let response = self.http.get(self.url("/api/products")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/api/products/{}", id)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check(response).await?.json().await?))
    }

    async fn create_product(&self, request: &CreateProductRequest) -> Result<Product, ClientError> {
        let response = self
            .http
            .post(self.url("/api/products"))
            .json(request)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn delete_product(&self, id: Uuid) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/products/{}", id)))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, ClientError> {
        let response = self
            .http
            .post(self.url("/api/orders"))
            .json(request)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ClientError> {
        let response = self.http.get(self.url("/api/orders")).send().await?;
        Ok(check(response).await?.json().await?)
    }
}
