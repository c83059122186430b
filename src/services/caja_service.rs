//! Sesiones de caja: apertura, cierre con arqueo, consulta de la sesión
//! activa y resumen de ventas de la sesión.

use sea_orm::*;
use serde::Serialize;
use std::collections::HashMap;

use super::ServiceError;
use crate::models::caja::{self, Entity as Caja};
use crate::models::caja_sesion::{self, Entity as CajaSesion};
use crate::models::producto::{self, Entity as Producto};
use crate::models::turno::{self, Entity as Turno};
use crate::models::venta::{self, Entity as Venta, ESTADO_PAGADA};
use crate::models::venta_item::{self, Entity as VentaItem};

#[derive(Debug, Clone)]
pub struct AbrirSesionInput {
    pub id_caja: i32,
    pub id_turno: i32,
    pub monto_inicial: f64,
    pub id_sede: i32,
}

#[derive(Debug, Serialize)]
pub struct SesionAbierta {
    #[serde(flatten)]
    pub sesion: caja_sesion::Model,
    pub caja_nombre: String,
    pub turno_nombre: String,
}

#[derive(Debug, Serialize)]
pub struct CierreSesion {
    #[serde(flatten)]
    pub sesion: caja_sesion::Model,
    pub monto_real_calculado: f64,
    pub monto_declarado: f64,
    pub diferencia: f64,
    pub total_ventas: f64,
    pub cantidad_ventas: u64,
}

#[derive(Debug, Serialize)]
pub struct CajaConEstado {
    #[serde(flatten)]
    pub caja: caja::Model,
    pub tiene_sesion_abierta: bool,
}

#[derive(Debug, Serialize)]
pub struct OpcionesApertura {
    pub cajas: Vec<CajaConEstado>,
    pub turnos: Vec<turno::Model>,
}

#[derive(Debug, Serialize)]
pub struct ResumenProducto {
    pub id_producto: i32,
    pub nombre: String,
    pub cantidad: f64,
    pub total: f64,
}

#[derive(Debug, Serialize)]
pub struct ResumenSesion {
    pub id_sesion: i32,
    pub monto_inicial: f64,
    pub total_ventas: f64,
    pub cantidad_ventas: u64,
    pub por_forma_pago: HashMap<String, f64>,
    pub por_producto: Vec<ResumenProducto>,
}

/// Abre una sesión de caja para el operador.
///
/// Dos reglas de unicidad: una sola sesión abierta por caja y una sola por
/// operador en la sede. Los índices parciales de la base respaldan ambas
/// por si dos aperturas llegan a la vez.
pub async fn abrir_sesion(
    db: &DatabaseConnection,
    id_usuario: i32,
    input: AbrirSesionInput,
) -> Result<SesionAbierta, ServiceError> {
    if input.monto_inicial < 0.0 {
        return Err(ServiceError::Validacion(
            "monto_inicial debe ser mayor o igual a 0".to_string(),
        ));
    }

    let caja_row = Caja::find_by_id(input.id_caja)
        .one(db)
        .await?
        .filter(|c| c.id_sede == input.id_sede)
        .ok_or(ServiceError::NotFound)?;
    let turno_row = Turno::find_by_id(input.id_turno)
        .one(db)
        .await?
        .filter(|t| t.id_sede == input.id_sede)
        .ok_or(ServiceError::NotFound)?;

    let caja_ocupada = CajaSesion::find()
        .filter(caja_sesion::Column::IdSede.eq(input.id_sede))
        .filter(caja_sesion::Column::IdCaja.eq(input.id_caja))
        .filter(caja_sesion::Column::CierreAt.is_null())
        .one(db)
        .await?;
    if caja_ocupada.is_some() {
        return Err(ServiceError::Conflicto(
            "Ya existe una sesión abierta en esta caja".to_string(),
        ));
    }

    let ya_abierta = CajaSesion::find()
        .filter(caja_sesion::Column::IdSede.eq(input.id_sede))
        .filter(caja_sesion::Column::IdUsuarioApertura.eq(id_usuario))
        .filter(caja_sesion::Column::CierreAt.is_null())
        .one(db)
        .await?;
    if ya_abierta.is_some() {
        return Err(ServiceError::Conflicto(
            "Ya tenés una sesión abierta. Cerrá la anterior primero.".to_string(),
        ));
    }

    let nueva = caja_sesion::ActiveModel {
        id_sede: Set(input.id_sede),
        id_caja: Set(input.id_caja),
        id_turno: Set(input.id_turno),
        id_usuario_apertura: Set(id_usuario),
        monto_inicial: Set(input.monto_inicial),
        apertura_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };
    let sesion = nueva.insert(db).await?;

    tracing::info!(
        id_sesion = sesion.id_sesion,
        id_caja = input.id_caja,
        monto_inicial = input.monto_inicial,
        "Sesión de caja abierta"
    );

    Ok(SesionAbierta {
        sesion,
        caja_nombre: caja_row.nombre,
        turno_nombre: turno_row.nombre,
    })
}

async fn totales_de_sesion(
    db: &DatabaseConnection,
    id_sesion: i32,
) -> Result<(f64, u64), ServiceError> {
    let ventas = Venta::find()
        .filter(venta::Column::IdSesion.eq(id_sesion))
        .filter(venta::Column::Estado.eq(ESTADO_PAGADA))
        .all(db)
        .await?;

    let total: f64 = ventas.iter().map(|v| v.total_neto).sum();
    Ok((total, ventas.len() as u64))
}

/// Cierra la sesión con el arqueo declarado.
///
/// `monto_real_calculado = monto_inicial + ventas pagadas de la sesión`;
/// `diferencia = declarado - calculado` (negativa cuando falta plata).
/// Solo el operador que abrió puede cerrar.
pub async fn cerrar_sesion(
    db: &DatabaseConnection,
    id_usuario: i32,
    id_sesion: i32,
    monto_final_declarado: f64,
    observaciones: Option<String>,
) -> Result<CierreSesion, ServiceError> {
    let sesion = CajaSesion::find_by_id(id_sesion)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    if sesion.cierre_at.is_some() {
        return Err(ServiceError::Conflicto(
            "Esta sesión ya está cerrada".to_string(),
        ));
    }
    if sesion.id_usuario_apertura != id_usuario {
        return Err(ServiceError::NoAutorizado(
            "Solo podés cerrar tu propia sesión".to_string(),
        ));
    }

    let (total_ventas, cantidad_ventas) = totales_de_sesion(db, id_sesion).await?;
    let monto_real_calculado = sesion.monto_inicial + total_ventas;
    let diferencia = monto_final_declarado - monto_real_calculado;

    let mut activa: caja_sesion::ActiveModel = sesion.into();
    activa.cierre_at = Set(Some(chrono::Utc::now().to_rfc3339()));
    activa.id_usuario_cierre = Set(Some(id_usuario));
    activa.monto_final_declarado = Set(Some(monto_final_declarado));
    activa.observaciones = Set(observaciones);
    let cerrada = activa.update(db).await?;

    tracing::info!(
        id_sesion,
        monto_final_declarado,
        monto_real_calculado,
        diferencia,
        "Sesión de caja cerrada"
    );

    Ok(CierreSesion {
        sesion: cerrada,
        monto_real_calculado,
        monto_declarado: monto_final_declarado,
        diferencia,
        total_ventas,
        cantidad_ventas,
    })
}

/// Sesión abierta del operador en la sede, si la hay.
pub async fn sesion_activa(
    db: &DatabaseConnection,
    id_usuario: i32,
    id_sede: i32,
) -> Result<Option<SesionAbierta>, ServiceError> {
    let sesion = CajaSesion::find()
        .filter(caja_sesion::Column::IdSede.eq(id_sede))
        .filter(caja_sesion::Column::IdUsuarioApertura.eq(id_usuario))
        .filter(caja_sesion::Column::CierreAt.is_null())
        .order_by_desc(caja_sesion::Column::AperturaAt)
        .one(db)
        .await?;

    let Some(sesion) = sesion else {
        return Ok(None);
    };

    let caja_nombre = Caja::find_by_id(sesion.id_caja)
        .one(db)
        .await?
        .map(|c| c.nombre)
        .unwrap_or_default();
    let turno_nombre = Turno::find_by_id(sesion.id_turno)
        .one(db)
        .await?
        .map(|t| t.nombre)
        .unwrap_or_default();

    Ok(Some(SesionAbierta {
        sesion,
        caja_nombre,
        turno_nombre,
    }))
}

/// Cajas de la sede con su disponibilidad, y los turnos activos. Es lo que
/// el front necesita para armar el formulario de apertura.
pub async fn opciones(db: &DatabaseConnection, id_sede: i32) -> Result<OpcionesApertura, ServiceError> {
    let cajas = Caja::find()
        .filter(caja::Column::IdSede.eq(id_sede))
        .filter(caja::Column::Activo.eq(true))
        .order_by_asc(caja::Column::Nombre)
        .all(db)
        .await?;

    let abiertas: Vec<i32> = CajaSesion::find()
        .filter(caja_sesion::Column::IdSede.eq(id_sede))
        .filter(caja_sesion::Column::CierreAt.is_null())
        .all(db)
        .await?
        .into_iter()
        .map(|s| s.id_caja)
        .collect();

    let cajas = cajas
        .into_iter()
        .map(|caja| CajaConEstado {
            tiene_sesion_abierta: abiertas.contains(&caja.id_caja),
            caja,
        })
        .collect();

    let turnos = Turno::find()
        .filter(turno::Column::IdSede.eq(id_sede))
        .filter(turno::Column::Activo.eq(true))
        .order_by_asc(turno::Column::HoraInicio)
        .all(db)
        .await?;

    Ok(OpcionesApertura { cajas, turnos })
}

/// Resumen de la sesión para el arqueo: totales por forma de pago y
/// cantidades vendidas por producto.
pub async fn resumen_sesion(
    db: &DatabaseConnection,
    id_sesion: i32,
) -> Result<ResumenSesion, ServiceError> {
    let sesion = CajaSesion::find_by_id(id_sesion)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let ventas = Venta::find()
        .filter(venta::Column::IdSesion.eq(id_sesion))
        .filter(venta::Column::Estado.eq(ESTADO_PAGADA))
        .all(db)
        .await?;

    let mut por_forma_pago: HashMap<String, f64> = HashMap::new();
    let mut total_ventas = 0.0;
    for v in &ventas {
        *por_forma_pago.entry(v.forma_pago.clone()).or_insert(0.0) += v.total_neto;
        total_ventas += v.total_neto;
    }

    let venta_ids: Vec<i32> = ventas.iter().map(|v| v.id_venta).collect();
    let mut por_producto_map: HashMap<i32, (f64, f64)> = HashMap::new();
    if !venta_ids.is_empty() {
        let items = VentaItem::find()
            .filter(venta_item::Column::IdVenta.is_in(venta_ids))
            .all(db)
            .await?;
        for item in items {
            let acc = por_producto_map.entry(item.id_producto).or_insert((0.0, 0.0));
            acc.0 += item.cantidad;
            acc.1 += item.subtotal;
        }
    }

    let producto_ids: Vec<i32> = por_producto_map.keys().copied().collect();
    let nombres: HashMap<i32, String> = if producto_ids.is_empty() {
        HashMap::new()
    } else {
        Producto::find()
            .filter(producto::Column::IdProducto.is_in(producto_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id_producto, p.nombre))
            .collect()
    };

    let mut por_producto: Vec<ResumenProducto> = por_producto_map
        .into_iter()
        .map(|(id_producto, (cantidad, total))| ResumenProducto {
            id_producto,
            nombre: nombres
                .get(&id_producto)
                .cloned()
                .unwrap_or_else(|| format!("producto {}", id_producto)),
            cantidad,
            total,
        })
        .collect();
    por_producto.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));

    Ok(ResumenSesion {
        id_sesion,
        monto_inicial: sesion.monto_inicial,
        total_ventas,
        cantidad_ventas: ventas.len() as u64,
        por_forma_pago,
        por_producto,
    })
}
