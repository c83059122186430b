use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use sea_orm::*;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{
    clear_session_cookie, create_jwt, session_cookie, verify_password, Claims, Rol,
};
use crate::models::rol::Entity as RolEntity;
use crate::models::usuario::{self, Entity as Usuario};

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

/// Login con cookie de sesión HTTP-only. El rol se resuelve acá, una sola
/// vez, y viaja tipado dentro del token.
pub async fn login(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    tracing::info!(username = %payload.username, "Intento de login");

    let user = match Usuario::find()
        .filter(usuario::Column::Username.eq(&payload.username))
        .filter(usuario::Column::Activo.eq(true))
        .one(&db)
        .await
    {
        Ok(Some(u)) => u,
        _ => {
            tracing::warn!(username = %payload.username, "Usuario inexistente o inactivo");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Credenciales inválidas" })),
            )
                .into_response();
        }
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        _ => {
            tracing::warn!(username = %user.username, "Password incorrecto");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Credenciales inválidas" })),
            )
                .into_response();
        }
    }

    let rol_nombre = match RolEntity::find_by_id(user.id_rol).one(&db).await {
        Ok(Some(r)) => r.nombre,
        _ => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Rol del usuario inexistente" })),
            )
                .into_response()
        }
    };

    let Some(rol) = Rol::parse(&rol_nombre) else {
        tracing::warn!(username = %user.username, rol = %rol_nombre, "Rol no reconocido");
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Rol no reconocido" })),
        )
            .into_response();
    };

    let token = match create_jwt(user.id_usuario, &user.username, rol, user.id_sede) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "No se pudo firmar el token");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error interno" })),
            )
                .into_response();
        }
    };

    let mut activo: usuario::ActiveModel = user.clone().into();
    activo.last_login_at = Set(Some(chrono::Utc::now().to_rfc3339()));
    if let Err(e) = activo.update(&db).await {
        // El login sigue siendo válido aunque no quede registrado
        tracing::warn!(username = %user.username, error = %e, "No se pudo actualizar last_login_at");
    }

    tracing::info!(username = %user.username, %rol, "Login exitoso");

    (
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(json!({
            "token": token,
            "usuario": {
                "id_usuario": user.id_usuario,
                "username": user.username,
                "nombre": user.nombre,
                "apellido": user.apellido,
                "rol": rol.to_string(),
                "id_sede": user.id_sede,
            }
        })),
    )
        .into_response()
}

/// Usuario autenticado, según el token vigente.
pub async fn me(State(db): State<DatabaseConnection>, claims: Claims) -> impl IntoResponse {
    match Usuario::find_by_id(claims.sub).one(&db).await {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(json!({
                "id_usuario": user.id_usuario,
                "username": user.username,
                "nombre": user.nombre,
                "apellido": user.apellido,
                "rol": claims.rol.to_string(),
                "id_sede": user.id_sede,
            })),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "No autorizado" })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

pub async fn logout() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(json!({ "ok": true })),
    )
        .into_response()
}
