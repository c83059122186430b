use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "compra_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_item: i32,
    pub id_compra: i32,
    pub id_producto: i32,
    pub cantidad: f64,
    pub precio_unitario: f64,
    pub subtotal: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::compra::Entity",
        from = "Column::IdCompra",
        to = "super::compra::Column::IdCompra",
        on_delete = "Cascade"
    )]
    Compra,
}

impl Related<super::compra::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Compra.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
