use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::*;
use serde::Deserialize;
use serde_json::json;

use super::error_response;
use crate::auth::Claims;
use crate::models::insumo::{self, Entity as Insumo};

#[derive(Deserialize, Default)]
pub struct ListQuery {
    q: Option<String>,
}

pub async fn list(
    State(db): State<DatabaseConnection>,
    _claims: Claims,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let mut select = Insumo::find().filter(insumo::Column::Activo.eq(true));
    if let Some(q) = query.q.as_deref().filter(|q| !q.is_empty()) {
        select = select.filter(insumo::Column::Nombre.contains(q));
    }

    match select.order_by_asc(insumo::Column::Nombre).all(&db).await {
        Ok(insumos) => (StatusCode::OK, Json(json!({ "insumos": insumos }))).into_response(),
        Err(e) => error_response(e.into()),
    }
}
