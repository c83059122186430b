use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::error_response;
use crate::auth::Claims;
use crate::db::AppState;
use crate::services::venta_service::{self, CrearVentaInput, ItemVenta};

#[derive(Deserialize)]
pub struct ItemVentaRequest {
    id_producto: i32,
    cantidad: f64,
    precio_unitario: f64,
}

#[derive(Deserialize)]
pub struct CrearVentaRequest {
    items: Vec<ItemVentaRequest>,
    forma_pago: String,
}

pub async fn create(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<CrearVentaRequest>,
) -> impl IntoResponse {
    let input = CrearVentaInput {
        items: payload
            .items
            .into_iter()
            .map(|i| ItemVenta {
                id_producto: i.id_producto,
                cantidad: i.cantidad,
                precio_unitario: i.precio_unitario,
            })
            .collect(),
        forma_pago: payload.forma_pago,
        id_sede: claims.id_sede,
    };

    match venta_service::crear_venta(
        &state.db,
        &state.afip,
        state.config.combo_sin_receta,
        claims.sub,
        input,
    )
    .await
    {
        Ok(venta) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "data": {
                    "id_venta": venta.id_venta,
                    "total": venta.total,
                    "items": venta.items,
                    "factura": venta.factura,
                    "es_comanda": venta.es_comanda,
                }
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize, Default)]
pub struct FacturarRequest {
    doc_nro: Option<i64>,
}

/// Factura a posteriori una venta que salió como comanda.
pub async fn facturar(
    State(state): State<AppState>,
    _claims: Claims,
    Path(id_venta): Path<i32>,
    payload: Option<Json<FacturarRequest>>,
) -> impl IntoResponse {
    let doc_nro = payload.and_then(|Json(p)| p.doc_nro);

    match venta_service::facturar_venta(&state.db, &state.afip, id_venta, doc_nro).await {
        Ok(factura) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "factura": factura })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
