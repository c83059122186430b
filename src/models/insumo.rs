use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Unidad de seguimiento de stock.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "insumos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_insumo: i32,
    pub nombre: String,
    pub unidad_medida: String,
    pub activo: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
