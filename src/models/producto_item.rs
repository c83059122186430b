use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Renglón de receta de un combo: cantidad de insumo por unidad vendida.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "producto_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_item: i32,
    pub id_producto: i32,
    pub id_insumo: i32,
    pub cantidad: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::producto::Entity",
        from = "Column::IdProducto",
        to = "super::producto::Column::IdProducto",
        on_delete = "Cascade"
    )]
    Producto,
    #[sea_orm(
        belongs_to = "super::insumo::Entity",
        from = "Column::IdInsumo",
        to = "super::insumo::Column::IdInsumo"
    )]
    Insumo,
}

impl Related<super::producto::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Producto.def()
    }
}

impl Related<super::insumo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Insumo.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
