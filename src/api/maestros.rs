//! Listados de datos maestros para los selectores del front.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use sea_orm::*;
use serde_json::json;

use super::error_response;
use crate::auth::Claims;
use crate::models::caja::{self, Entity as Caja};
use crate::models::rol::{self, Entity as RolEntity};
use crate::models::sede::{self, Entity as Sede};
use crate::models::turno::{self, Entity as Turno};

pub async fn sedes(State(db): State<DatabaseConnection>, _claims: Claims) -> impl IntoResponse {
    match Sede::find()
        .filter(sede::Column::Activo.eq(true))
        .order_by_asc(sede::Column::Nombre)
        .all(&db)
        .await
    {
        Ok(sedes) => (StatusCode::OK, Json(json!({ "sedes": sedes }))).into_response(),
        Err(e) => error_response(e.into()),
    }
}

pub async fn cajas(State(db): State<DatabaseConnection>, claims: Claims) -> impl IntoResponse {
    match Caja::find()
        .filter(caja::Column::IdSede.eq(claims.id_sede))
        .filter(caja::Column::Activo.eq(true))
        .order_by_asc(caja::Column::Nombre)
        .all(&db)
        .await
    {
        Ok(cajas) => (StatusCode::OK, Json(json!({ "cajas": cajas }))).into_response(),
        Err(e) => error_response(e.into()),
    }
}

pub async fn turnos(State(db): State<DatabaseConnection>, claims: Claims) -> impl IntoResponse {
    match Turno::find()
        .filter(turno::Column::IdSede.eq(claims.id_sede))
        .filter(turno::Column::Activo.eq(true))
        .order_by_asc(turno::Column::HoraInicio)
        .all(&db)
        .await
    {
        Ok(turnos) => (StatusCode::OK, Json(json!({ "turnos": turnos }))).into_response(),
        Err(e) => error_response(e.into()),
    }
}

pub async fn roles(State(db): State<DatabaseConnection>, _claims: Claims) -> impl IntoResponse {
    match RolEntity::find()
        .order_by_asc(rol::Column::Nivel)
        .all(&db)
        .await
    {
        Ok(roles) => (StatusCode::OK, Json(json!({ "roles": roles }))).into_response(),
        Err(e) => error_response(e.into()),
    }
}
