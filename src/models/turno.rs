use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "turnos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_turno: i32,
    pub id_sede: i32,
    pub nombre: String,
    /// HH:MM:SS
    pub hora_inicio: String,
    pub hora_fin: String,
    pub activo: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
