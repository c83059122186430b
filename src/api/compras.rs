use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;

use super::error_response;
use crate::auth::Claims;
use crate::services::compra_service::{self, CrearCompraInput, ItemCompra};

#[derive(Deserialize)]
pub struct ItemCompraRequest {
    id_producto: i32,
    cantidad: f64,
    precio_unitario: f64,
}

#[derive(Deserialize)]
pub struct CrearCompraRequest {
    id_proveedor: i32,
    items: Vec<ItemCompraRequest>,
    observacion: Option<String>,
}

pub async fn create(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<CrearCompraRequest>,
) -> impl IntoResponse {
    let input = CrearCompraInput {
        id_proveedor: payload.id_proveedor,
        items: payload
            .items
            .into_iter()
            .map(|i| ItemCompra {
                id_producto: i.id_producto,
                cantidad: i.cantidad,
                precio_unitario: i.precio_unitario,
            })
            .collect(),
        observacion: payload.observacion,
        id_sede: claims.id_sede,
    };

    match compra_service::crear_compra(&db, claims.sub, input).await {
        Ok(compra) => (
            StatusCode::CREATED,
            Json(json!({
                "ok": true,
                "id_compra": compra.id_compra,
                "total": compra.total,
                "items": compra.items,
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn list(State(db): State<DatabaseConnection>, claims: Claims) -> impl IntoResponse {
    match compra_service::listar_compras(&db, claims.id_sede).await {
        Ok(compras) => (StatusCode::OK, Json(json!({ "compras": compras }))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn get_by_id(
    State(db): State<DatabaseConnection>,
    _claims: Claims,
    Path(id_compra): Path<i32>,
) -> impl IntoResponse {
    match compra_service::compra_por_id(&db, id_compra).await {
        Ok(compra) => (StatusCode::OK, Json(json!(compra))).into_response(),
        Err(e) => error_response(e),
    }
}
