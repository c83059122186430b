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
use crate::models::proveedor::{self, Entity as Proveedor};
use crate::services::ServiceError;

pub async fn list(State(db): State<DatabaseConnection>, _claims: Claims) -> impl IntoResponse {
    match Proveedor::find()
        .filter(proveedor::Column::Activo.eq(true))
        .order_by_asc(proveedor::Column::Nombre)
        .all(&db)
        .await
    {
        Ok(proveedores) => {
            (StatusCode::OK, Json(json!({ "proveedores": proveedores }))).into_response()
        }
        Err(e) => error_response(e.into()),
    }
}

#[derive(Deserialize)]
pub struct CrearProveedorRequest {
    nombre: String,
    cuit: Option<String>,
    telefono: Option<String>,
    email: Option<String>,
}

pub async fn create(
    State(db): State<DatabaseConnection>,
    _claims: Claims,
    Json(payload): Json<CrearProveedorRequest>,
) -> impl IntoResponse {
    if payload.nombre.trim().is_empty() {
        return error_response(ServiceError::Validacion("nombre requerido".to_string()));
    }

    let nuevo = proveedor::ActiveModel {
        nombre: Set(payload.nombre.trim().to_string()),
        cuit: Set(payload.cuit),
        telefono: Set(payload.telefono),
        email: Set(payload.email),
        activo: Set(true),
        ..Default::default()
    };

    match nuevo.insert(&db).await {
        Ok(proveedor) => (
            StatusCode::CREATED,
            Json(json!({ "ok": true, "proveedor": proveedor })),
        )
            .into_response(),
        Err(e) => error_response(e.into()),
    }
}

#[derive(Deserialize)]
pub struct ActualizarProveedorRequest {
    nombre: Option<String>,
    cuit: Option<String>,
    telefono: Option<String>,
    email: Option<String>,
    activo: Option<bool>,
}

pub async fn update(
    State(db): State<DatabaseConnection>,
    _claims: Claims,
    Path(id_proveedor): Path<i32>,
    Json(payload): Json<ActualizarProveedorRequest>,
) -> impl IntoResponse {
    let existente = match Proveedor::find_by_id(id_proveedor).one(&db).await {
        Ok(Some(p)) => p,
        Ok(None) => return error_response(ServiceError::NotFound),
        Err(e) => return error_response(e.into()),
    };

    let mut activo: proveedor::ActiveModel = existente.into();
    if let Some(nombre) = payload.nombre {
        activo.nombre = Set(nombre.trim().to_string());
    }
    if let Some(cuit) = payload.cuit {
        activo.cuit = Set(Some(cuit));
    }
    if let Some(telefono) = payload.telefono {
        activo.telefono = Set(Some(telefono));
    }
    if let Some(email) = payload.email {
        activo.email = Set(Some(email));
    }
    if let Some(es_activo) = payload.activo {
        activo.activo = Set(es_activo);
    }

    match activo.update(&db).await {
        Ok(proveedor) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "proveedor": proveedor })),
        )
            .into_response(),
        Err(e) => error_response(e.into()),
    }
}

/// Baja lógica: las compras históricas siguen apuntando al proveedor.
pub async fn delete(
    State(db): State<DatabaseConnection>,
    _claims: Claims,
    Path(id_proveedor): Path<i32>,
) -> impl IntoResponse {
    let existente = match Proveedor::find_by_id(id_proveedor).one(&db).await {
        Ok(Some(p)) => p,
        Ok(None) => return error_response(ServiceError::NotFound),
        Err(e) => return error_response(e.into()),
    };

    let mut activo: proveedor::ActiveModel = existente.into();
    activo.activo = Set(false);

    match activo.update(&db).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "ok": true }))).into_response(),
        Err(e) => error_response(e.into()),
    }
}
