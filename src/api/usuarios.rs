use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::*;
use serde::Deserialize;
use serde_json::json;

use super::error_response;
use crate::auth::{hash_password, Claims};
use crate::models::rol::Entity as RolEntity;
use crate::models::sede::Entity as Sede;
use crate::models::usuario::{self, Entity as Usuario};
use crate::services::ServiceError;

/// Toda la administración de usuarios es para admin o superadmin.
fn exigir_admin(claims: &Claims) -> Result<(), Response> {
    if claims.rol.es_admin() {
        Ok(())
    } else {
        Err(error_response(ServiceError::NoAutorizado(
            "Requiere rol de administrador".to_string(),
        )))
    }
}

pub async fn list(State(db): State<DatabaseConnection>, claims: Claims) -> impl IntoResponse {
    if let Err(resp) = exigir_admin(&claims) {
        return resp;
    }

    let usuarios = match Usuario::find()
        .order_by_asc(usuario::Column::Username)
        .all(&db)
        .await
    {
        Ok(u) => u,
        Err(e) => return error_response(e.into()),
    };

    let roles: std::collections::HashMap<i32, String> = match RolEntity::find().all(&db).await {
        Ok(r) => r.into_iter().map(|r| (r.id_rol, r.nombre)).collect(),
        Err(e) => return error_response(e.into()),
    };
    let sedes: std::collections::HashMap<i32, String> = match Sede::find().all(&db).await {
        Ok(s) => s.into_iter().map(|s| (s.id_sede, s.nombre)).collect(),
        Err(e) => return error_response(e.into()),
    };

    let salida: Vec<_> = usuarios
        .into_iter()
        .map(|u| {
            json!({
                "id_usuario": u.id_usuario,
                "username": u.username,
                "nombre": u.nombre,
                "apellido": u.apellido,
                "email": u.email,
                "rol": roles.get(&u.id_rol),
                "id_rol": u.id_rol,
                "sede": sedes.get(&u.id_sede),
                "id_sede": u.id_sede,
                "activo": u.activo,
                "last_login_at": u.last_login_at,
            })
        })
        .collect();

    (StatusCode::OK, Json(json!({ "usuarios": salida }))).into_response()
}

#[derive(Deserialize)]
pub struct CrearUsuarioRequest {
    username: String,
    password: String,
    nombre: String,
    apellido: String,
    email: Option<String>,
    id_rol: i32,
    id_sede: i32,
}

pub async fn create(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<CrearUsuarioRequest>,
) -> impl IntoResponse {
    if let Err(resp) = exigir_admin(&claims) {
        return resp;
    }
    if payload.username.trim().is_empty() || payload.password.len() < 6 {
        return error_response(ServiceError::Validacion(
            "username requerido y password de al menos 6 caracteres".to_string(),
        ));
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => return error_response(ServiceError::Database(e)),
    };

    let now = chrono::Utc::now().to_rfc3339();
    let nuevo = usuario::ActiveModel {
        username: Set(payload.username.trim().to_string()),
        password_hash: Set(password_hash),
        nombre: Set(payload.nombre),
        apellido: Set(payload.apellido),
        email: Set(payload.email),
        id_rol: Set(payload.id_rol),
        id_sede: Set(payload.id_sede),
        activo: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    match nuevo.insert(&db).await {
        Ok(u) => (
            StatusCode::CREATED,
            Json(json!({ "ok": true, "usuario": u })),
        )
            .into_response(),
        Err(e) => error_response(e.into()),
    }
}

#[derive(Deserialize)]
pub struct ActualizarUsuarioRequest {
    nombre: Option<String>,
    apellido: Option<String>,
    email: Option<String>,
    password: Option<String>,
    id_rol: Option<i32>,
    id_sede: Option<i32>,
    activo: Option<bool>,
}

pub async fn update(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id_usuario): Path<i32>,
    Json(payload): Json<ActualizarUsuarioRequest>,
) -> impl IntoResponse {
    if let Err(resp) = exigir_admin(&claims) {
        return resp;
    }

    let existente = match Usuario::find_by_id(id_usuario).one(&db).await {
        Ok(Some(u)) => u,
        Ok(None) => return error_response(ServiceError::NotFound),
        Err(e) => return error_response(e.into()),
    };

    let mut activo: usuario::ActiveModel = existente.into();
    if let Some(nombre) = payload.nombre {
        activo.nombre = Set(nombre);
    }
    if let Some(apellido) = payload.apellido {
        activo.apellido = Set(apellido);
    }
    if let Some(email) = payload.email {
        activo.email = Set(Some(email));
    }
    if let Some(password) = payload.password {
        if password.len() < 6 {
            return error_response(ServiceError::Validacion(
                "password de al menos 6 caracteres".to_string(),
            ));
        }
        match hash_password(&password) {
            Ok(h) => activo.password_hash = Set(h),
            Err(e) => return error_response(ServiceError::Database(e)),
        }
    }
    if let Some(id_rol) = payload.id_rol {
        activo.id_rol = Set(id_rol);
    }
    if let Some(id_sede) = payload.id_sede {
        activo.id_sede = Set(id_sede);
    }
    if let Some(es_activo) = payload.activo {
        activo.activo = Set(es_activo);
    }
    activo.updated_at = Set(chrono::Utc::now().to_rfc3339());

    match activo.update(&db).await {
        Ok(u) => (StatusCode::OK, Json(json!({ "ok": true, "usuario": u }))).into_response(),
        Err(e) => error_response(e.into()),
    }
}

/// Baja lógica. Un admin no puede darse de baja a sí mismo.
pub async fn delete(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id_usuario): Path<i32>,
) -> impl IntoResponse {
    if let Err(resp) = exigir_admin(&claims) {
        return resp;
    }
    if id_usuario == claims.sub {
        return error_response(ServiceError::Validacion(
            "No podés desactivar tu propio usuario".to_string(),
        ));
    }

    let existente = match Usuario::find_by_id(id_usuario).one(&db).await {
        Ok(Some(u)) => u,
        Ok(None) => return error_response(ServiceError::NotFound),
        Err(e) => return error_response(e.into()),
    };

    let mut activo: usuario::ActiveModel = existente.into();
    activo.activo = Set(false);
    activo.updated_at = Set(chrono::Utc::now().to_rfc3339());

    match activo.update(&db).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "ok": true }))).into_response(),
        Err(e) => error_response(e.into()),
    }
}
