use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const TIPO_KIOSCO: &str = "kiosco";
pub const TIPO_ELABORADO: &str = "elaborado";
pub const TIPO_COMBO: &str = "combo";

/// Producto vendible. Los combos no tienen insumo directo: su stock se deriva
/// de la receta en `producto_items`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "productos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_producto: i32,
    pub nombre: String,
    pub id_categoria: i32,
    pub precio: f64,
    /// 'kiosco' | 'elaborado' | 'combo'
    pub tipo: String,
    pub id_insumo_stock: Option<i32>,
    pub requiere_comanda: bool,
    pub activo: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Model {
    pub fn es_combo(&self) -> bool {
        self.tipo == TIPO_COMBO
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categoria::Entity",
        from = "Column::IdCategoria",
        to = "super::categoria::Column::IdCategoria"
    )]
    Categoria,
    #[sea_orm(has_many = "super::producto_item::Entity")]
    Items,
}

impl Related<super::categoria::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categoria.def()
    }
}

impl Related<super::producto_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
