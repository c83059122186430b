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
use crate::services::stock_service;

#[derive(Deserialize)]
pub struct StockSedeRequest {
    id_sede: i32,
    cantidad: f64,
}

#[derive(Deserialize)]
pub struct ActualizarStockRequest {
    id_insumo: i32,
    stocks: Vec<StockSedeRequest>,
}

/// Ajuste manual de inventario: fija el stock del insumo en valores
/// absolutos por sede.
pub async fn update(
    State(db): State<DatabaseConnection>,
    _claims: Claims,
    Json(payload): Json<ActualizarStockRequest>,
) -> impl IntoResponse {
    let stocks: Vec<(i32, f64)> = payload
        .stocks
        .iter()
        .map(|s| (s.id_sede, s.cantidad))
        .collect();

    match stock_service::actualizar_stock_absoluto(&db, payload.id_insumo, &stocks).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "ok": true }))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn por_insumo(
    State(db): State<DatabaseConnection>,
    _claims: Claims,
    Path(id_insumo): Path<i32>,
) -> impl IntoResponse {
    match stock_service::stock_por_insumo(&db, id_insumo).await {
        Ok(stocks) => (StatusCode::OK, Json(json!({ "stocks": stocks }))).into_response(),
        Err(e) => error_response(e),
    }
}
