use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::app::dto::{self, CreateProductRequest, ProductResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:name", get(get_product))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let product = services.create_product(body).await?;

    Ok((StatusCode::CREATED, Json(ProductResponse::from(&product))))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<impl IntoResponse, ApiError> {
    let products = services.list_products().await?;
    Ok(Json(dto::products_to_response(&products)))
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = services.get_product(&name).await?;
    Ok(Json(ProductResponse::from(&product)))
}
