use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::*;
use serde::Deserialize;
use serde_json::json;

use super::error_response;
use crate::auth::Claims;
use crate::models::categoria::{self, Entity as Categoria};
use crate::services::ServiceError;

pub async fn list(State(db): State<DatabaseConnection>, _claims: Claims) -> impl IntoResponse {
    match Categoria::find()
        .filter(categoria::Column::Activo.eq(true))
        .order_by_asc(categoria::Column::Nombre)
        .all(&db)
        .await
    {
        Ok(categorias) => (StatusCode::OK, Json(json!({ "categorias": categorias }))).into_response(),
        Err(e) => error_response(e.into()),
    }
}

#[derive(Deserialize)]
pub struct CrearCategoriaRequest {
    nombre: String,
}

pub async fn create(
    State(db): State<DatabaseConnection>,
    _claims: Claims,
    Json(payload): Json<CrearCategoriaRequest>,
) -> impl IntoResponse {
    if payload.nombre.trim().is_empty() {
        return error_response(ServiceError::Validacion("nombre requerido".to_string()));
    }

    let nueva = categoria::ActiveModel {
        nombre: Set(payload.nombre.trim().to_string()),
        activo: Set(true),
        ..Default::default()
    };

    match nueva.insert(&db).await {
        Ok(categoria) => (
            StatusCode::CREATED,
            Json(json!({ "ok": true, "categoria": categoria })),
        )
            .into_response(),
        Err(e) => error_response(e.into()),
    }
}

#[derive(Deserialize)]
pub struct ActualizarCategoriaRequest {
    nombre: Option<String>,
    activo: Option<bool>,
}

pub async fn update(
    State(db): State<DatabaseConnection>,
    _claims: Claims,
    Path(id_categoria): Path<i32>,
    Json(payload): Json<ActualizarCategoriaRequest>,
) -> impl IntoResponse {
    let existente = match Categoria::find_by_id(id_categoria).one(&db).await {
        Ok(Some(c)) => c,
        Ok(None) => return error_response(ServiceError::NotFound),
        Err(e) => return error_response(e.into()),
    };

    let mut activa: categoria::ActiveModel = existente.into();
    if let Some(nombre) = payload.nombre {
        activa.nombre = Set(nombre.trim().to_string());
    }
    if let Some(activo) = payload.activo {
        activa.activo = Set(activo);
    }

    match activa.update(&db).await {
        Ok(categoria) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "categoria": categoria })),
        )
            .into_response(),
        Err(e) => error_response(e.into()),
    }
}

pub async fn delete(
    State(db): State<DatabaseConnection>,
    _claims: Claims,
    Path(id_categoria): Path<i32>,
) -> impl IntoResponse {
    let existente = match Categoria::find_by_id(id_categoria).one(&db).await {
        Ok(Some(c)) => c,
        Ok(None) => return error_response(ServiceError::NotFound),
        Err(e) => return error_response(e.into()),
    };

    let mut activa: categoria::ActiveModel = existente.into();
    activa.activo = Set(false);

    match activa.update(&db).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "ok": true }))).into_response(),
        Err(e) => error_response(e.into()),
    }
}
