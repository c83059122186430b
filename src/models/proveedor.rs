use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "proveedores")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_proveedor: i32,
    pub nombre: String,
    pub cuit: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub activo: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
