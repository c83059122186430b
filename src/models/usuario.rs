use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usuarios")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_usuario: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub nombre: String,
    pub apellido: String,
    pub email: Option<String>,
    pub id_rol: i32,
    pub id_sede: i32,
    pub activo: bool,
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rol::Entity",
        from = "Column::IdRol",
        to = "super::rol::Column::IdRol"
    )]
    Rol,
}

impl Related<super::rol::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rol.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
