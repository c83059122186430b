use axum::{
    extract::{Path, Query, State},
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
use crate::models::producto::{self, Entity as Producto, TIPO_COMBO, TIPO_ELABORADO, TIPO_KIOSCO};
use crate::models::producto_item::{self, Entity as ProductoItem};
use crate::services::{stock_service, ServiceError};

const PER_PAGE_DEFAULT: u64 = 20;

#[derive(Deserialize)]
pub struct ListQuery {
    page: Option<u64>,
    per_page: Option<u64>,
    q: Option<String>,
    id_categoria: Option<i32>,
}

/// Los admins ven el stock consolidado de todas las sedes; el resto, solo
/// el de la suya.
fn filtro_sede(claims: &Claims) -> Option<i32> {
    if claims.rol.es_admin() {
        None
    } else {
        Some(claims.id_sede)
    }
}

async fn con_stock(
    db: &DatabaseConnection,
    productos: Vec<producto::Model>,
    filtro: Option<i32>,
) -> Result<Vec<serde_json::Value>, ServiceError> {
    let mut salida = Vec::with_capacity(productos.len());
    for p in productos {
        let receta = if p.es_combo() {
            ProductoItem::find()
                .filter(producto_item::Column::IdProducto.eq(p.id_producto))
                .all(db)
                .await?
        } else {
            Vec::new()
        };
        let stock = stock_service::stock_de_producto(db, &p, &receta, filtro).await?;

        let mut valor = serde_json::to_value(&p).unwrap_or_default();
        if let Some(obj) = valor.as_object_mut() {
            obj.insert("stock".to_string(), json!(stock));
        }
        salida.push(valor);
    }
    Ok(salida)
}

pub async fn list(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(PER_PAGE_DEFAULT).clamp(1, 100);

    let mut select = Producto::find().filter(producto::Column::Activo.eq(true));
    if let Some(q) = query.q.as_deref().filter(|q| !q.is_empty()) {
        select = select.filter(producto::Column::Nombre.contains(q));
    }
    if let Some(id_categoria) = query.id_categoria {
        select = select.filter(producto::Column::IdCategoria.eq(id_categoria));
    }

    let paginator = select
        .order_by_asc(producto::Column::Nombre)
        .paginate(&db, per_page);

    let total = match paginator.num_items().await {
        Ok(t) => t,
        Err(e) => return error_response(e.into()),
    };
    let productos = match paginator.fetch_page(page - 1).await {
        Ok(p) => p,
        Err(e) => return error_response(e.into()),
    };

    match con_stock(&db, productos, filtro_sede(&claims)).await {
        Ok(productos) => (
            StatusCode::OK,
            Json(json!({
                "productos": productos,
                "total": total,
                "page": page,
                "per_page": per_page,
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct SearchQuery {
    q: String,
}

/// Búsqueda rápida para el checkout: hasta 20 coincidencias por nombre.
pub async fn search(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let productos = match Producto::find()
        .filter(producto::Column::Activo.eq(true))
        .filter(producto::Column::Nombre.contains(&query.q))
        .order_by_asc(producto::Column::Nombre)
        .limit(20)
        .all(&db)
        .await
    {
        Ok(p) => p,
        Err(e) => return error_response(e.into()),
    };

    match con_stock(&db, productos, filtro_sede(&claims)).await {
        Ok(productos) => (StatusCode::OK, Json(json!({ "productos": productos }))).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct ItemRecetaRequest {
    id_insumo: i32,
    cantidad: f64,
}

#[derive(Deserialize)]
pub struct CrearProductoRequest {
    nombre: String,
    id_categoria: i32,
    precio: f64,
    /// 'kiosco' | 'elaborado' | 'combo'
    tipo: String,
    #[serde(default)]
    requiere_comanda: bool,
    unidad_medida: Option<String>,
    /// Receta, solo para combos.
    #[serde(default)]
    items: Vec<ItemRecetaRequest>,
}

/// Alta de producto. Para kiosco y elaborado se crea el insumo de stock
/// asociado con el mismo nombre; para combos se carga la receta.
pub async fn create(
    State(db): State<DatabaseConnection>,
    _claims: Claims,
    Json(payload): Json<CrearProductoRequest>,
) -> impl IntoResponse {
    if payload.nombre.trim().is_empty() {
        return error_response(ServiceError::Validacion("nombre requerido".to_string()));
    }
    if payload.precio < 0.0 {
        return error_response(ServiceError::Validacion(
            "precio debe ser mayor o igual a 0".to_string(),
        ));
    }
    if !matches!(
        payload.tipo.as_str(),
        TIPO_KIOSCO | TIPO_ELABORADO | TIPO_COMBO
    ) {
        return error_response(ServiceError::Validacion(format!(
            "tipo inválido: {}",
            payload.tipo
        )));
    }

    let es_combo = payload.tipo == TIPO_COMBO;
    let now = chrono::Utc::now().to_rfc3339();

    let resultado: Result<producto::Model, ServiceError> = async {
        let txn = db.begin().await?;

        let id_insumo_stock = if es_combo {
            None
        } else {
            let nuevo_insumo = insumo::ActiveModel {
                nombre: Set(payload.nombre.trim().to_string()),
                unidad_medida: Set(payload
                    .unidad_medida
                    .clone()
                    .unwrap_or_else(|| "unidad".to_string())),
                activo: Set(true),
                ..Default::default()
            };
            Some(nuevo_insumo.insert(&txn).await?.id_insumo)
        };

        let nuevo = producto::ActiveModel {
            nombre: Set(payload.nombre.trim().to_string()),
            id_categoria: Set(payload.id_categoria),
            precio: Set(payload.precio),
            tipo: Set(payload.tipo.clone()),
            id_insumo_stock: Set(id_insumo_stock),
            requiere_comanda: Set(payload.requiere_comanda),
            activo: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };
        let guardado = nuevo.insert(&txn).await?;

        if es_combo {
            for item in &payload.items {
                if item.cantidad <= 0.0 {
                    return Err(ServiceError::Validacion(
                        "cantidad de receta debe ser mayor a 0".to_string(),
                    ));
                }
                let renglon = producto_item::ActiveModel {
                    id_producto: Set(guardado.id_producto),
                    id_insumo: Set(item.id_insumo),
                    cantidad: Set(item.cantidad),
                    ..Default::default()
                };
                renglon.insert(&txn).await?;
            }
        }

        txn.commit().await?;
        Ok(guardado)
    }
    .await;

    match resultado {
        Ok(producto) => (
            StatusCode::CREATED,
            Json(json!({ "ok": true, "producto": producto })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct ActualizarProductoRequest {
    nombre: Option<String>,
    id_categoria: Option<i32>,
    precio: Option<f64>,
    requiere_comanda: Option<bool>,
    activo: Option<bool>,
    /// Si viene, reemplaza la receta completa.
    items: Option<Vec<ItemRecetaRequest>>,
}

pub async fn update(
    State(db): State<DatabaseConnection>,
    _claims: Claims,
    Path(id_producto): Path<i32>,
    Json(payload): Json<ActualizarProductoRequest>,
) -> impl IntoResponse {
    let existente = match Producto::find_by_id(id_producto).one(&db).await {
        Ok(Some(p)) => p,
        Ok(None) => return error_response(ServiceError::NotFound),
        Err(e) => return error_response(e.into()),
    };

    if payload.items.is_some() && !existente.es_combo() {
        return error_response(ServiceError::Validacion(
            "Solo los combos tienen receta".to_string(),
        ));
    }
    if let Some(precio) = payload.precio {
        if precio < 0.0 {
            return error_response(ServiceError::Validacion(
                "precio debe ser mayor o igual a 0".to_string(),
            ));
        }
    }

    let resultado: Result<producto::Model, ServiceError> = async {
        let txn = db.begin().await?;

        let mut activo: producto::ActiveModel = existente.clone().into();
        if let Some(nombre) = &payload.nombre {
            activo.nombre = Set(nombre.trim().to_string());
        }
        if let Some(id_categoria) = payload.id_categoria {
            activo.id_categoria = Set(id_categoria);
        }
        if let Some(precio) = payload.precio {
            activo.precio = Set(precio);
        }
        if let Some(requiere_comanda) = payload.requiere_comanda {
            activo.requiere_comanda = Set(requiere_comanda);
        }
        if let Some(es_activo) = payload.activo {
            activo.activo = Set(es_activo);
        }
        activo.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let actualizado = activo.update(&txn).await?;

        if let Some(items) = &payload.items {
            ProductoItem::delete_many()
                .filter(producto_item::Column::IdProducto.eq(id_producto))
                .exec(&txn)
                .await?;
            for item in items {
                if item.cantidad <= 0.0 {
                    return Err(ServiceError::Validacion(
                        "cantidad de receta debe ser mayor a 0".to_string(),
                    ));
                }
                let renglon = producto_item::ActiveModel {
                    id_producto: Set(id_producto),
                    id_insumo: Set(item.id_insumo),
                    cantidad: Set(item.cantidad),
                    ..Default::default()
                };
                renglon.insert(&txn).await?;
            }
        }

        txn.commit().await?;
        Ok(actualizado)
    }
    .await;

    match resultado {
        Ok(producto) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "producto": producto })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Baja lógica: el producto deja de listarse pero las ventas históricas
/// siguen referenciándolo.
pub async fn delete(
    State(db): State<DatabaseConnection>,
    _claims: Claims,
    Path(id_producto): Path<i32>,
) -> impl IntoResponse {
    let existente = match Producto::find_by_id(id_producto).one(&db).await {
        Ok(Some(p)) => p,
        Ok(None) => return error_response(ServiceError::NotFound),
        Err(e) => return error_response(e.into()),
    };

    let mut activo: producto::ActiveModel = existente.into();
    activo.activo = Set(false);
    activo.updated_at = Set(chrono::Utc::now().to_rfc3339());

    match activo.update(&db).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "ok": true }))).into_response(),
        Err(e) => error_response(e.into()),
    }
}

/// Receta del combo con nombre y unidad de cada insumo.
pub async fn ingredientes(
    State(db): State<DatabaseConnection>,
    _claims: Claims,
    Path(id_producto): Path<i32>,
) -> impl IntoResponse {
    let producto = match Producto::find_by_id(id_producto).one(&db).await {
        Ok(Some(p)) => p,
        Ok(None) => return error_response(ServiceError::NotFound),
        Err(e) => return error_response(e.into()),
    };

    let receta = match ProductoItem::find()
        .filter(producto_item::Column::IdProducto.eq(id_producto))
        .find_also_related(Insumo)
        .all(&db)
        .await
    {
        Ok(r) => r,
        Err(e) => return error_response(e.into()),
    };

    let items: Vec<_> = receta
        .into_iter()
        .map(|(item, insumo)| {
            json!({
                "id_insumo": item.id_insumo,
                "cantidad": item.cantidad,
                "nombre": insumo.as_ref().map(|i| i.nombre.clone()),
                "unidad_medida": insumo.map(|i| i.unidad_medida),
            })
        })
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "id_producto": producto.id_producto,
            "nombre": producto.nombre,
            "tipo": producto.tipo,
            "items": items,
        })),
    )
        .into_response()
}
