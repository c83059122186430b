use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "compras")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_compra: i32,
    pub id_proveedor: i32,
    pub id_usuario: i32,
    pub id_sede: i32,
    pub fecha_hora: String,
    pub observacion: Option<String>,
    pub estado: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::proveedor::Entity",
        from = "Column::IdProveedor",
        to = "super::proveedor::Column::IdProveedor"
    )]
    Proveedor,
    #[sea_orm(has_many = "super::compra_item::Entity")]
    Items,
}

impl Related<super::proveedor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Proveedor.def()
    }
}

impl Related<super::compra_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
