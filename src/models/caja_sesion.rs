use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sesión de caja: abierta mientras `cierre_at` es NULL, cerrada después.
/// Nunca se reabre ni se borra.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "caja_sesiones")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_sesion: i32,
    pub id_sede: i32,
    pub id_caja: i32,
    pub id_turno: i32,
    pub id_usuario_apertura: i32,
    pub monto_inicial: f64,
    pub apertura_at: String,
    pub id_usuario_cierre: Option<i32>,
    pub cierre_at: Option<String>,
    pub monto_final_declarado: Option<f64>,
    pub observaciones: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::usuario::Entity",
        from = "Column::IdUsuarioApertura",
        to = "super::usuario::Column::IdUsuario"
    )]
    UsuarioApertura,
}

impl Related<super::usuario::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UsuarioApertura.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
