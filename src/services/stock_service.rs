//! Stock por sede: consultas de disponibilidad, stock virtual de combos y
//! escrituras atómicas (upsert absoluto y suma incremental).

use sea_orm::*;

use super::ServiceError;
use crate::models::producto::{self};
use crate::models::producto_item;
use crate::models::stock_sede::{self, Entity as StockSede};

/// Suma el stock de un insumo, en una sede puntual o en todas.
pub async fn sumar_stock_insumo<C: ConnectionTrait>(
    conn: &C,
    id_insumo: i32,
    filtro_sede: Option<i32>,
) -> Result<f64, ServiceError> {
    let mut query = StockSede::find().filter(stock_sede::Column::IdInsumo.eq(id_insumo));

    if let Some(id_sede) = filtro_sede {
        query = query.filter(stock_sede::Column::IdSede.eq(id_sede));
    }

    let rows = query.all(conn).await?;
    Ok(rows.iter().map(|r| r.cantidad_actual).sum())
}

/// Stock reportado para un producto.
///
/// Combos: `min(floor(stock_insumo / cantidad_receta))` sobre la receta
/// (stock "virtual"); receta vacía reporta 0. Productos con insumo directo:
/// suma del stock del insumo. El resto no maneja stock y reporta 0.
pub async fn stock_de_producto<C: ConnectionTrait>(
    conn: &C,
    producto: &producto::Model,
    receta: &[producto_item::Model],
    filtro_sede: Option<i32>,
) -> Result<f64, ServiceError> {
    if producto.es_combo() {
        if receta.is_empty() {
            return Ok(0.0);
        }

        let mut limite = f64::MAX;
        for item in receta {
            if item.cantidad <= 0.0 {
                continue;
            }
            let disponible = sumar_stock_insumo(conn, item.id_insumo, filtro_sede).await?;
            limite = limite.min((disponible / item.cantidad).floor());
        }
        return Ok(if limite == f64::MAX { 0.0 } else { limite });
    }

    if let Some(id_insumo) = producto.id_insumo_stock {
        return sumar_stock_insumo(conn, id_insumo, filtro_sede).await;
    }

    Ok(0.0)
}

/// Fija el stock de un insumo en valores absolutos por sede.
/// Upsert sobre la clave única (id_sede, id_insumo).
pub async fn actualizar_stock_absoluto(
    db: &DatabaseConnection,
    id_insumo: i32,
    stocks: &[(i32, f64)],
) -> Result<(), ServiceError> {
    let now = chrono::Utc::now().to_rfc3339();

    for (id_sede, cantidad) in stocks {
        if *cantidad < 0.0 {
            return Err(ServiceError::Validacion(
                "cantidad debe ser mayor o igual a 0".to_string(),
            ));
        }

        db.execute(Statement::from_sql_and_values(
            db.get_database_backend(),
            r#"
            INSERT INTO stock_sede (id_sede, id_insumo, cantidad_actual, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (id_sede, id_insumo)
            DO UPDATE SET cantidad_actual = excluded.cantidad_actual,
                          updated_at = excluded.updated_at
            "#,
            [
                (*id_sede).into(),
                id_insumo.into(),
                (*cantidad).into(),
                now.clone().into(),
            ],
        ))
        .await?;
    }

    Ok(())
}

/// Suma `cantidad` al stock de un insumo en una sede, creando la fila si no
/// existe. El incremento es atómico: se hace en el UPDATE, no leyendo antes.
pub async fn incrementar_stock<C: ConnectionTrait>(
    conn: &C,
    id_sede: i32,
    id_insumo: i32,
    cantidad: f64,
) -> Result<(), ServiceError> {
    let now = chrono::Utc::now().to_rfc3339();

    conn.execute(Statement::from_sql_and_values(
        conn.get_database_backend(),
        r#"
        INSERT INTO stock_sede (id_sede, id_insumo, cantidad_actual, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (id_sede, id_insumo)
        DO UPDATE SET cantidad_actual = cantidad_actual + excluded.cantidad_actual,
                      updated_at = excluded.updated_at
        "#,
        [id_sede.into(), id_insumo.into(), cantidad.into(), now.into()],
    ))
    .await?;

    Ok(())
}

/// Descuenta `cantidad` del stock con un UPDATE condicional atómico.
///
/// Devuelve `false` si el stock no alcanzaba (ninguna fila afectada); el
/// llamador decide si eso aborta la operación. Dos descuentos concurrentes
/// nunca pierden una resta: la condición `cantidad_actual >= ?` se evalúa
/// dentro del UPDATE.
pub async fn descontar_stock_condicional<C: ConnectionTrait>(
    conn: &C,
    id_sede: i32,
    id_insumo: i32,
    cantidad: f64,
) -> Result<bool, ServiceError> {
    let now = chrono::Utc::now().to_rfc3339();

    let result = conn
        .execute(Statement::from_sql_and_values(
            conn.get_database_backend(),
            r#"
            UPDATE stock_sede
            SET cantidad_actual = cantidad_actual - ?, updated_at = ?
            WHERE id_sede = ? AND id_insumo = ? AND cantidad_actual >= ?
            "#,
            [
                cantidad.into(),
                now.into(),
                id_sede.into(),
                id_insumo.into(),
                cantidad.into(),
            ],
        ))
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Stock de un insumo desglosado por sede.
pub async fn stock_por_insumo(
    db: &DatabaseConnection,
    id_insumo: i32,
) -> Result<Vec<stock_sede::Model>, ServiceError> {
    let rows = StockSede::find()
        .filter(stock_sede::Column::IdInsumo.eq(id_insumo))
        .order_by_asc(stock_sede::Column::IdSede)
        .all(db)
        .await?;
    Ok(rows)
}
