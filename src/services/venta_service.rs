//! Flujo de venta: resolución de recetas, agregación de requerimientos,
//! validación de disponibilidad, registro de la venta, facturación y
//! descuento de stock.
//!
//! Toda la secuencia corre dentro de una transacción: si la emisión de la
//! factura (o cualquier paso) falla, no queda ni la cabecera ni los items.

use sea_orm::*;
use std::collections::HashMap;

use super::stock_service;
use super::ServiceError;
use crate::afip::{AfipClient, FacturaEmitida};
use crate::config::PoliticaComboSinReceta;
use crate::models::caja_sesion::{self, Entity as CajaSesion};
use crate::models::factura;
use crate::models::insumo::Entity as Insumo;
use crate::models::producto::{self, Entity as Producto};
use crate::models::producto_item::{self, Entity as ProductoItem};
use crate::models::stock_sede::{self, Entity as StockSede};
use crate::models::venta::{self, requiere_factura, ESTADO_PAGADA};
use crate::models::venta_item;

#[derive(Debug, Clone)]
pub struct ItemVenta {
    pub id_producto: i32,
    pub cantidad: f64,
    pub precio_unitario: f64,
}

#[derive(Debug, Clone)]
pub struct CrearVentaInput {
    pub items: Vec<ItemVenta>,
    pub forma_pago: String,
    pub id_sede: i32,
}

#[derive(Debug)]
pub struct VentaCreada {
    pub id_venta: i32,
    pub total: f64,
    pub items: usize,
    pub factura: Option<FacturaEmitida>,
    pub es_comanda: bool,
}

/// Receta efectiva de cada producto pedido: lista de (id_insumo, cantidad
/// por unidad). Combos usan su receta; productos con insumo directo, 1:1;
/// el resto no aparece en el mapa (stock no gestionado).
pub async fn resolver_recetas<C: ConnectionTrait>(
    conn: &C,
    productos: &[producto::Model],
) -> Result<HashMap<i32, Vec<(i32, f64)>>, ServiceError> {
    let combo_ids: Vec<i32> = productos
        .iter()
        .filter(|p| p.es_combo())
        .map(|p| p.id_producto)
        .collect();

    let mut recetas_combo: HashMap<i32, Vec<(i32, f64)>> = HashMap::new();
    if !combo_ids.is_empty() {
        let filas = ProductoItem::find()
            .filter(producto_item::Column::IdProducto.is_in(combo_ids))
            .all(conn)
            .await?;
        for fila in filas {
            recetas_combo
                .entry(fila.id_producto)
                .or_default()
                .push((fila.id_insumo, fila.cantidad));
        }
    }

    let mut recetas = HashMap::new();
    for p in productos {
        if p.es_combo() {
            recetas.insert(
                p.id_producto,
                recetas_combo.remove(&p.id_producto).unwrap_or_default(),
            );
        } else if let Some(id_insumo) = p.id_insumo_stock {
            recetas.insert(p.id_producto, vec![(id_insumo, 1.0)]);
        }
    }

    Ok(recetas)
}

/// Requerimiento total por insumo: suma de (cantidad de receta x cantidad
/// pedida) sobre todos los renglones. Función pura; el resultado no depende
/// del orden de iteración.
pub fn agregar_requerimientos(
    items: &[ItemVenta],
    recetas: &HashMap<i32, Vec<(i32, f64)>>,
) -> HashMap<i32, f64> {
    let mut requerimientos: HashMap<i32, f64> = HashMap::new();

    for item in items {
        if let Some(receta) = recetas.get(&item.id_producto) {
            for (id_insumo, cantidad_unitaria) in receta {
                *requerimientos.entry(*id_insumo).or_insert(0.0) +=
                    cantidad_unitaria * item.cantidad;
            }
        }
    }

    requerimientos
}

/// Compara los requerimientos agregados contra el stock de la sede. Un
/// insumo sin fila de stock cuenta como 0. Falla en el primer faltante con
/// el detalle requerido/disponible.
pub async fn validar_disponibilidad<C: ConnectionTrait>(
    conn: &C,
    id_sede: i32,
    requerimientos: &HashMap<i32, f64>,
) -> Result<(), ServiceError> {
    if requerimientos.is_empty() {
        return Ok(());
    }

    let insumo_ids: Vec<i32> = requerimientos.keys().copied().collect();

    let stock_rows = StockSede::find()
        .filter(stock_sede::Column::IdSede.eq(id_sede))
        .filter(stock_sede::Column::IdInsumo.is_in(insumo_ids.clone()))
        .all(conn)
        .await?;
    let stock_map: HashMap<i32, f64> = stock_rows
        .into_iter()
        .map(|s| (s.id_insumo, s.cantidad_actual))
        .collect();

    for (id_insumo, requerido) in requerimientos {
        let disponible = stock_map.get(id_insumo).copied().unwrap_or(0.0);
        if disponible < *requerido {
            let nombre = Insumo::find_by_id(*id_insumo)
                .one(conn)
                .await?
                .map(|i| i.nombre)
                .unwrap_or_else(|| format!("insumo {}", id_insumo));

            return Err(ServiceError::StockInsuficiente {
                insumo: nombre,
                requerido: *requerido,
                disponible,
            });
        }
    }

    Ok(())
}

/// Sesión de caja abierta del operador en la sede; precondición de toda venta.
async fn sesion_abierta<C: ConnectionTrait>(
    conn: &C,
    id_usuario: i32,
    id_sede: i32,
) -> Result<Option<caja_sesion::Model>, ServiceError> {
    let sesion = CajaSesion::find()
        .filter(caja_sesion::Column::IdSede.eq(id_sede))
        .filter(caja_sesion::Column::IdUsuarioApertura.eq(id_usuario))
        .filter(caja_sesion::Column::CierreAt.is_null())
        .order_by_desc(caja_sesion::Column::AperturaAt)
        .one(conn)
        .await?;
    Ok(sesion)
}

pub async fn crear_venta(
    db: &DatabaseConnection,
    afip: &AfipClient,
    politica_combo: PoliticaComboSinReceta,
    id_usuario: i32,
    input: CrearVentaInput,
) -> Result<VentaCreada, ServiceError> {
    if input.items.is_empty() {
        return Err(ServiceError::Validacion("Items requeridos".to_string()));
    }
    if input.items.iter().any(|i| i.cantidad <= 0.0) {
        return Err(ServiceError::Validacion(
            "cantidad debe ser mayor a 0".to_string(),
        ));
    }

    let sesion = sesion_abierta(db, id_usuario, input.id_sede)
        .await?
        .ok_or_else(|| {
            ServiceError::Conflicto(
                "No tenés una caja abierta. Abrí la caja antes de vender.".to_string(),
            )
        })?;

    let producto_ids: Vec<i32> = input.items.iter().map(|i| i.id_producto).collect();
    let productos = Producto::find()
        .filter(producto::Column::IdProducto.is_in(producto_ids))
        .all(db)
        .await?;

    let recetas = resolver_recetas(db, &productos).await?;

    // Combos sin receta: según la política configurada se venden sin
    // impacto de stock o se rechaza la venta completa.
    for p in productos.iter().filter(|p| p.es_combo()) {
        let receta_vacia = recetas
            .get(&p.id_producto)
            .map(|r| r.is_empty())
            .unwrap_or(true);
        if receta_vacia {
            match politica_combo {
                PoliticaComboSinReceta::Permitir => {
                    tracing::warn!(producto = %p.nombre, "Combo sin receta: se vende sin descontar stock");
                }
                PoliticaComboSinReceta::Rechazar => {
                    return Err(ServiceError::Conflicto(format!(
                        "El combo {} no tiene receta cargada",
                        p.nombre
                    )));
                }
            }
        }
    }

    let requerimientos = agregar_requerimientos(&input.items, &recetas);

    let total: f64 = input
        .items
        .iter()
        .map(|i| i.precio_unitario * i.cantidad)
        .sum();

    let es_comanda = !requiere_factura(&input.forma_pago);
    let now = chrono::Utc::now().to_rfc3339();

    let txn = db.begin().await?;

    validar_disponibilidad(&txn, input.id_sede, &requerimientos).await?;

    let nueva_venta = venta::ActiveModel {
        id_sede: Set(input.id_sede),
        id_sesion: Set(sesion.id_sesion),
        id_usuario: Set(id_usuario),
        fecha_hora: Set(now.clone()),
        total_bruto: Set(total),
        total_neto: Set(total),
        descuento_total: Set(0.0),
        forma_pago: Set(input.forma_pago.clone()),
        estado: Set(ESTADO_PAGADA.to_owned()),
        ..Default::default()
    };
    let venta_guardada = nueva_venta.insert(&txn).await?;

    for item in &input.items {
        let nuevo_item = venta_item::ActiveModel {
            id_venta: Set(venta_guardada.id_venta),
            id_producto: Set(item.id_producto),
            cantidad: Set(item.cantidad),
            precio_unitario: Set(item.precio_unitario),
            subtotal: Set(item.precio_unitario * item.cantidad),
            ..Default::default()
        };
        nuevo_item.insert(&txn).await?;
    }

    // Descuento atómico por insumo. Si otra venta concurrente ganó el
    // stock entre la validación y acá, el UPDATE condicional no afecta
    // filas y la transacción entera se revierte.
    for (id_insumo, requerido) in &requerimientos {
        let ok = stock_service::descontar_stock_condicional(
            &txn,
            input.id_sede,
            *id_insumo,
            *requerido,
        )
        .await?;

        if !ok {
            let disponible = StockSede::find()
                .filter(stock_sede::Column::IdSede.eq(input.id_sede))
                .filter(stock_sede::Column::IdInsumo.eq(*id_insumo))
                .one(&txn)
                .await?
                .map(|s| s.cantidad_actual)
                .unwrap_or(0.0);
            let nombre = Insumo::find_by_id(*id_insumo)
                .one(&txn)
                .await?
                .map(|i| i.nombre)
                .unwrap_or_else(|| format!("insumo {}", id_insumo));

            return Err(ServiceError::StockInsuficiente {
                insumo: nombre,
                requerido: *requerido,
                disponible,
            });
        }
    }

    // Transferencia y débito exigen factura antes de confirmar. Si AFIP
    // falla, el rollback deja la base sin rastro de la venta.
    let factura_emitida = if !es_comanda {
        match afip.crear_factura(total, None).await {
            Ok(emitida) => {
                let mut venta_activa: venta::ActiveModel = venta_guardada.clone().into();
                venta_activa.cae = Set(Some(emitida.cae.clone()));
                venta_activa.cae_vencimiento = Set(Some(emitida.cae_vencimiento.clone()));
                venta_activa.nro_comprobante = Set(Some(emitida.numero_comprobante));
                venta_activa.punto_venta = Set(Some(emitida.punto_venta));
                venta_activa.tipo_comprobante = Set(Some(emitida.tipo_comprobante));
                venta_activa.update(&txn).await?;

                let nueva_factura = factura::ActiveModel {
                    id_venta: Set(venta_guardada.id_venta),
                    tipo: Set(emitida.tipo_comprobante.to_string()),
                    punto_venta: Set(emitida.punto_venta.to_string()),
                    numero: Set(emitida.numero_comprobante.to_string()),
                    cae: Set(emitida.cae.clone()),
                    vto_cae: Set(emitida.cae_vencimiento.clone()),
                    estado: Set("aprobada".to_owned()),
                    created_at: Set(now),
                    ..Default::default()
                };
                nueva_factura.insert(&txn).await?;

                Some(emitida)
            }
            Err(e) => {
                txn.rollback().await?;
                return Err(ServiceError::Upstream(e.to_string()));
            }
        }
    } else {
        None
    };

    txn.commit().await?;

    Ok(VentaCreada {
        id_venta: venta_guardada.id_venta,
        total,
        items: input.items.len(),
        factura: factura_emitida,
        es_comanda,
    })
}

/// Factura a posteriori una venta existente (ventas que salieron como
/// comanda o reintentos manuales).
pub async fn facturar_venta(
    db: &DatabaseConnection,
    afip: &AfipClient,
    id_venta: i32,
    doc_nro: Option<i64>,
) -> Result<FacturaEmitida, ServiceError> {
    let venta_row = venta::Entity::find_by_id(id_venta)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let ya_facturada = factura::Entity::find()
        .filter(factura::Column::IdVenta.eq(id_venta))
        .one(db)
        .await?;
    if ya_facturada.is_some() {
        return Err(ServiceError::Conflicto(
            "Esta venta ya fue facturada".to_string(),
        ));
    }

    let emitida = afip
        .crear_factura(venta_row.total_neto, doc_nro)
        .await
        .map_err(|e| ServiceError::Upstream(e.to_string()))?;

    let now = chrono::Utc::now().to_rfc3339();
    let txn = db.begin().await?;

    let nueva_factura = factura::ActiveModel {
        id_venta: Set(id_venta),
        tipo: Set(emitida.tipo_comprobante.to_string()),
        punto_venta: Set(emitida.punto_venta.to_string()),
        numero: Set(emitida.numero_comprobante.to_string()),
        cae: Set(emitida.cae.clone()),
        vto_cae: Set(emitida.cae_vencimiento.clone()),
        estado: Set("aprobada".to_owned()),
        created_at: Set(now),
        ..Default::default()
    };
    nueva_factura.insert(&txn).await?;

    let mut venta_activa: venta::ActiveModel = venta_row.into();
    venta_activa.cae = Set(Some(emitida.cae.clone()));
    venta_activa.cae_vencimiento = Set(Some(emitida.cae_vencimiento.clone()));
    venta_activa.nro_comprobante = Set(Some(emitida.numero_comprobante));
    venta_activa.punto_venta = Set(Some(emitida.punto_venta));
    venta_activa.tipo_comprobante = Set(Some(emitida.tipo_comprobante));
    venta_activa.update(&txn).await?;

    txn.commit().await?;

    Ok(emitida)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id_producto: i32, cantidad: f64) -> ItemVenta {
        ItemVenta {
            id_producto,
            cantidad,
            precio_unitario: 100.0,
        }
    }

    #[test]
    fn agrega_requerimientos_de_combo_y_directo() {
        // Producto 1: combo con 2 de pan (insumo 10) y 1 de queso (insumo 11).
        // Producto 2: directo sobre pan.
        let mut recetas = HashMap::new();
        recetas.insert(1, vec![(10, 2.0), (11, 1.0)]);
        recetas.insert(2, vec![(10, 1.0)]);

        let items = vec![item(1, 3.0), item(2, 4.0)];
        let reqs = agregar_requerimientos(&items, &recetas);

        assert_eq!(reqs.get(&10), Some(&10.0)); // 3*2 + 4*1
        assert_eq!(reqs.get(&11), Some(&3.0));
    }

    #[test]
    fn producto_sin_receta_no_suma_requerimiento() {
        let recetas = HashMap::new();
        let reqs = agregar_requerimientos(&[item(5, 2.0)], &recetas);
        assert!(reqs.is_empty());
    }

    #[test]
    fn repetir_producto_acumula() {
        let mut recetas = HashMap::new();
        recetas.insert(1, vec![(10, 1.5)]);

        let reqs = agregar_requerimientos(&[item(1, 2.0), item(1, 1.0)], &recetas);
        assert_eq!(reqs.get(&10), Some(&4.5));
    }
}
