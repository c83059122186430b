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
use crate::services::caja_service::{self, AbrirSesionInput};

#[derive(Deserialize)]
pub struct AbrirSesionRequest {
    id_caja: i32,
    id_turno: i32,
    monto_inicial: f64,
}

pub async fn abrir_sesion(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<AbrirSesionRequest>,
) -> impl IntoResponse {
    let input = AbrirSesionInput {
        id_caja: payload.id_caja,
        id_turno: payload.id_turno,
        monto_inicial: payload.monto_inicial,
        id_sede: claims.id_sede,
    };

    match caja_service::abrir_sesion(&db, claims.sub, input).await {
        Ok(sesion) => (StatusCode::CREATED, Json(json!({ "ok": true, "sesion": sesion })))
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct CerrarSesionRequest {
    id_sesion: i32,
    monto_final_declarado: f64,
    observaciones: Option<String>,
}

pub async fn cerrar_sesion(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<CerrarSesionRequest>,
) -> impl IntoResponse {
    match caja_service::cerrar_sesion(
        &db,
        claims.sub,
        payload.id_sesion,
        payload.monto_final_declarado,
        payload.observaciones,
    )
    .await
    {
        Ok(cierre) => (StatusCode::OK, Json(json!(cierre))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn sesion_activa(
    State(db): State<DatabaseConnection>,
    claims: Claims,
) -> impl IntoResponse {
    match caja_service::sesion_activa(&db, claims.sub, claims.id_sede).await {
        Ok(sesion) => (StatusCode::OK, Json(json!({ "sesion": sesion }))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn opciones(State(db): State<DatabaseConnection>, claims: Claims) -> impl IntoResponse {
    match caja_service::opciones(&db, claims.id_sede).await {
        Ok(opciones) => (StatusCode::OK, Json(json!(opciones))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn resumen(
    State(db): State<DatabaseConnection>,
    _claims: Claims,
    Path(id_sesion): Path<i32>,
) -> impl IntoResponse {
    match caja_service::resumen_sesion(&db, id_sesion).await {
        Ok(resumen) => (StatusCode::OK, Json(json!(resumen))).into_response(),
        Err(e) => error_response(e),
    }
}
