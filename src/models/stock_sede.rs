use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stock disponible de un insumo en una sede. Única por (id_sede, id_insumo).
///
/// Las deducciones se hacen con UPDATE condicional atómico
/// (`cantidad_actual = cantidad_actual - ? ... AND cantidad_actual >= ?`),
/// nunca leyendo y reescribiendo el valor.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_sede")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_stock: i32,
    pub id_sede: i32,
    pub id_insumo: i32,
    pub cantidad_actual: f64,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::insumo::Entity",
        from = "Column::IdInsumo",
        to = "super::insumo::Column::IdInsumo"
    )]
    Insumo,
}

impl Related<super::insumo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Insumo.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
