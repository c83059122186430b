//! Compras a proveedores: registro transaccional de la compra y suma del
//! stock recibido en la sede.

use sea_orm::*;
use serde::Serialize;

use super::stock_service;
use super::ServiceError;
use crate::models::compra::{self, Entity as Compra};
use crate::models::compra_item::{self, Entity as CompraItem};
use crate::models::producto::{self, Entity as Producto};
use crate::models::proveedor::Entity as Proveedor;

#[derive(Debug, Clone)]
pub struct ItemCompra {
    pub id_producto: i32,
    pub cantidad: f64,
    pub precio_unitario: f64,
}

#[derive(Debug, Clone)]
pub struct CrearCompraInput {
    pub id_proveedor: i32,
    pub items: Vec<ItemCompra>,
    pub observacion: Option<String>,
    pub id_sede: i32,
}

#[derive(Debug, Serialize)]
pub struct CompraCreada {
    pub id_compra: i32,
    pub total: f64,
    pub items: usize,
}

#[derive(Debug, Serialize)]
pub struct CompraConDetalle {
    #[serde(flatten)]
    pub compra: compra::Model,
    pub proveedor_nombre: String,
    pub total: f64,
    pub items: Vec<compra_item::Model>,
}

/// Registra una compra confirmada y suma el stock recibido.
///
/// Cabecera, renglones e incrementos de stock van en una transacción. Solo
/// los productos con insumo de stock asociado impactan inventario; un
/// combo comprado (caso raro pero permitido) no suma nada.
pub async fn crear_compra(
    db: &DatabaseConnection,
    id_usuario: i32,
    input: CrearCompraInput,
) -> Result<CompraCreada, ServiceError> {
    if input.items.is_empty() {
        return Err(ServiceError::Validacion("Items requeridos".to_string()));
    }
    if input
        .items
        .iter()
        .any(|i| i.cantidad <= 0.0 || i.precio_unitario < 0.0)
    {
        return Err(ServiceError::Validacion(
            "cantidad debe ser mayor a 0 y precio_unitario mayor o igual a 0".to_string(),
        ));
    }

    Proveedor::find_by_id(input.id_proveedor)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let producto_ids: Vec<i32> = input.items.iter().map(|i| i.id_producto).collect();
    let productos = Producto::find()
        .filter(producto::Column::IdProducto.is_in(producto_ids.clone()))
        .all(db)
        .await?;
    for id in &producto_ids {
        if !productos.iter().any(|p| p.id_producto == *id) {
            return Err(ServiceError::Validacion(format!(
                "Producto {} inexistente",
                id
            )));
        }
    }

    let total: f64 = input
        .items
        .iter()
        .map(|i| i.cantidad * i.precio_unitario)
        .sum();
    let now = chrono::Utc::now().to_rfc3339();

    let txn = db.begin().await?;

    let nueva = compra::ActiveModel {
        id_proveedor: Set(input.id_proveedor),
        id_usuario: Set(id_usuario),
        id_sede: Set(input.id_sede),
        fecha_hora: Set(now.clone()),
        observacion: Set(input.observacion.clone()),
        estado: Set("confirmada".to_owned()),
        created_at: Set(now),
        ..Default::default()
    };
    let compra_guardada = nueva.insert(&txn).await?;

    for item in &input.items {
        let nuevo_item = compra_item::ActiveModel {
            id_compra: Set(compra_guardada.id_compra),
            id_producto: Set(item.id_producto),
            cantidad: Set(item.cantidad),
            precio_unitario: Set(item.precio_unitario),
            subtotal: Set(item.cantidad * item.precio_unitario),
            ..Default::default()
        };
        nuevo_item.insert(&txn).await?;

        let producto = productos
            .iter()
            .find(|p| p.id_producto == item.id_producto)
            .ok_or(ServiceError::NotFound)?;
        if let Some(id_insumo) = producto.id_insumo_stock {
            stock_service::incrementar_stock(&txn, input.id_sede, id_insumo, item.cantidad)
                .await?;
        }
    }

    txn.commit().await?;

    tracing::info!(
        id_compra = compra_guardada.id_compra,
        total,
        items = input.items.len(),
        "Compra registrada"
    );

    Ok(CompraCreada {
        id_compra: compra_guardada.id_compra,
        total,
        items: input.items.len(),
    })
}

/// Compras de la sede, más recientes primero.
pub async fn listar_compras(
    db: &DatabaseConnection,
    id_sede: i32,
) -> Result<Vec<CompraConDetalle>, ServiceError> {
    let compras = Compra::find()
        .filter(compra::Column::IdSede.eq(id_sede))
        .order_by_desc(compra::Column::FechaHora)
        .all(db)
        .await?;

    let mut detalle = Vec::with_capacity(compras.len());
    for compra_row in compras {
        detalle.push(armar_detalle(db, compra_row).await?);
    }
    Ok(detalle)
}

pub async fn compra_por_id(
    db: &DatabaseConnection,
    id_compra: i32,
) -> Result<CompraConDetalle, ServiceError> {
    let compra_row = Compra::find_by_id(id_compra)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;
    armar_detalle(db, compra_row).await
}

async fn armar_detalle(
    db: &DatabaseConnection,
    compra_row: compra::Model,
) -> Result<CompraConDetalle, ServiceError> {
    let proveedor_nombre = Proveedor::find_by_id(compra_row.id_proveedor)
        .one(db)
        .await?
        .map(|p| p.nombre)
        .unwrap_or_default();

    let items = CompraItem::find()
        .filter(compra_item::Column::IdCompra.eq(compra_row.id_compra))
        .all(db)
        .await?;
    let total = items.iter().map(|i| i.subtotal).sum();

    Ok(CompraConDetalle {
        compra: compra_row,
        proveedor_nombre,
        total,
        items,
    })
}
