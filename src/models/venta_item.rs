use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "venta_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_item: i32,
    pub id_venta: i32,
    pub id_producto: i32,
    pub cantidad: f64,
    pub precio_unitario: f64,
    pub subtotal: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::venta::Entity",
        from = "Column::IdVenta",
        to = "super::venta::Column::IdVenta",
        on_delete = "Cascade"
    )]
    Venta,
    #[sea_orm(
        belongs_to = "super::producto::Entity",
        from = "Column::IdProducto",
        to = "super::producto::Column::IdProducto"
    )]
    Producto,
}

impl Related<super::venta::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Venta.def()
    }
}

impl Related<super::producto::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Producto.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
