//! Lógica de negocio, separada de los handlers HTTP.
//!
//! Funciones libres sobre la conexión; los handlers traducen `ServiceError`
//! al status HTTP que corresponda.

pub mod caja_service;
pub mod compra_service;
pub mod stock_service;
pub mod venta_service;

use std::fmt;

#[derive(Debug)]
pub enum ServiceError {
    /// Entidad referida inexistente -> 404
    NotFound,
    /// Request mal formado o fuera de rango -> 400
    Validacion(String),
    /// Regla de negocio violada (sesión duplicada, ya cerrada, ya facturada) -> 400
    Conflicto(String),
    /// El usuario no puede operar sobre el recurso -> 403
    NoAutorizado(String),
    /// Faltante de stock, con el detalle del insumo corto -> 400
    StockInsuficiente {
        insumo: String,
        requerido: f64,
        disponible: f64,
    },
    /// Falla de persistencia -> 500
    Database(String),
    /// Falla del servicio externo de facturación -> 500
    Upstream(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::NotFound => write!(f, "No encontrado"),
            ServiceError::Validacion(msg) => write!(f, "{}", msg),
            ServiceError::Conflicto(msg) => write!(f, "{}", msg),
            ServiceError::NoAutorizado(msg) => write!(f, "{}", msg),
            ServiceError::StockInsuficiente {
                insumo,
                requerido,
                disponible,
            } => write!(
                f,
                "Stock insuficiente para {}. Requerido: {}, Disponible: {}",
                insumo, requerido, disponible
            ),
            ServiceError::Database(msg) => write!(f, "Error de base de datos: {}", msg),
            ServiceError::Upstream(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self {
        ServiceError::Database(e.to_string())
    }
}
