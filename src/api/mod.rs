pub mod auth;
pub mod caja;
pub mod categorias;
pub mod compras;
pub mod health;
pub mod insumos;
pub mod maestros;
pub mod productos;
pub mod proveedores;
pub mod stock;
pub mod usuarios;
pub mod ventas;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;

use crate::db::AppState;
use crate::services::ServiceError;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        // Ventas
        .route("/ventas/create", post(ventas::create))
        .route("/ventas/:id/facturar", post(ventas::facturar))
        // Caja
        .route("/caja/abrir-sesion", post(caja::abrir_sesion))
        .route("/caja/cerrar-sesion", post(caja::cerrar_sesion))
        .route("/caja/sesion-activa", get(caja::sesion_activa))
        .route("/caja/opciones", get(caja::opciones))
        .route("/caja/sesiones/:id/resumen", get(caja::resumen))
        // Productos
        .route(
            "/productos",
            get(productos::list).post(productos::create),
        )
        .route("/productos/search", get(productos::search))
        .route(
            "/productos/:id",
            put(productos::update).delete(productos::delete),
        )
        .route("/productos/:id/ingredientes", get(productos::ingredientes))
        // Stock
        .route("/stock", put(stock::update))
        .route("/stock/insumo/:id", get(stock::por_insumo))
        // Insumos y categorías
        .route("/insumos", get(insumos::list))
        .route(
            "/categorias",
            get(categorias::list).post(categorias::create),
        )
        .route(
            "/categorias/:id",
            put(categorias::update).delete(categorias::delete),
        )
        // Compras
        .route("/compras", get(compras::list).post(compras::create))
        .route("/compras/:id", get(compras::get_by_id))
        .route(
            "/proveedores",
            get(proveedores::list).post(proveedores::create),
        )
        .route(
            "/proveedores/:id",
            put(proveedores::update).delete(proveedores::delete),
        )
        // Administración de usuarios
        .route("/usuarios", get(usuarios::list).post(usuarios::create))
        .route(
            "/usuarios/:id",
            put(usuarios::update).delete(usuarios::delete),
        )
        // Datos maestros
        .route("/sedes", get(maestros::sedes))
        .route("/cajas", get(maestros::cajas))
        .route("/turnos", get(maestros::turnos))
        .route("/roles", get(maestros::roles))
        .with_state(state)
}

/// Traduce un `ServiceError` a la respuesta HTTP que ve el front.
pub fn error_response(e: ServiceError) -> Response {
    let status = match &e {
        ServiceError::NotFound => StatusCode::NOT_FOUND,
        ServiceError::Validacion(_)
        | ServiceError::Conflicto(_)
        | ServiceError::StockInsuficiente { .. } => StatusCode::BAD_REQUEST,
        ServiceError::NoAutorizado(_) => StatusCode::FORBIDDEN,
        ServiceError::Database(_) | ServiceError::Upstream(_) => {
            tracing::error!(error = %e, "Error interno");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(json!({ "error": e.to_string() }))).into_response()
}
