use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const ESTADO_PAGADA: &str = "pagada";

pub const FORMA_PAGO_EFECTIVO: &str = "efectivo";
pub const FORMA_PAGO_TRANSFERENCIA: &str = "transferencia";
pub const FORMA_PAGO_DEBITO: &str = "debito";

/// Transferencia y débito exigen factura electrónica; el resto queda como
/// comanda interna.
pub fn requiere_factura(forma_pago: &str) -> bool {
    matches!(forma_pago, FORMA_PAGO_TRANSFERENCIA | FORMA_PAGO_DEBITO)
}

/// Venta cerrada en un checkout. Inmutable salvo los campos de resultado de
/// facturación, que se completan al emitir.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ventas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_venta: i32,
    pub id_sede: i32,
    pub id_sesion: i32,
    pub id_usuario: i32,
    pub fecha_hora: String,
    pub total_bruto: f64,
    pub total_neto: f64,
    pub descuento_total: f64,
    pub forma_pago: String,
    pub estado: String,
    pub cae: Option<String>,
    pub cae_vencimiento: Option<String>,
    pub nro_comprobante: Option<i64>,
    pub punto_venta: Option<i32>,
    pub tipo_comprobante: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::venta_item::Entity")]
    Items,
}

impl Related<super::venta_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
