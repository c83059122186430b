use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Registro local del comprobante autorizado por AFIP. Una por venta.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "facturas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_factura: i32,
    pub id_venta: i32,
    pub tipo: String,
    pub punto_venta: String,
    pub numero: String,
    pub cae: String,
    /// Vencimiento del CAE, YYYY-MM-DD
    pub vto_cae: String,
    pub estado: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::venta::Entity",
        from = "Column::IdVenta",
        to = "super::venta::Column::IdVenta"
    )]
    Venta,
}

impl Related<super::venta::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Venta.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
