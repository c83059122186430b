use std::env;

/// Qué hacer con un combo sin receta cargada al venderlo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoliticaComboSinReceta {
    /// Se vende igual, sin impacto de stock (se loguea un warning).
    Permitir,
    /// La venta se rechaza con 400.
    Rechazar,
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub combo_sin_receta: PoliticaComboSinReceta,
    pub afip: AfipConfig,
}

/// Configuración del servicio de facturación electrónica (AFIP/ARCA).
///
/// Se construye una sola vez en el bootstrap y se inyecta en el cliente;
/// no hay singleton global.
#[derive(Clone)]
pub struct AfipConfig {
    pub cuit: i64,
    pub punto_venta: i32,
    pub tipo_comprobante: i32,
    pub base_url: String,
}

impl AfipConfig {
    pub fn habilitado(&self) -> bool {
        self.cuit != 0
    }
}

const AFIP_URL_HOMOLOGACION: &str = "https://wswhomo.afip.gov.ar/wsfev1";
const AFIP_URL_PRODUCCION: &str = "https://servicios1.afip.gov.ar/wsfev1";

impl Config {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://maxikiosco.db?mode=rwc".to_string());

        let combo_sin_receta = match env::var("COMBO_SIN_RECETA").as_deref() {
            Ok("rechazar") => PoliticaComboSinReceta::Rechazar,
            _ => PoliticaComboSinReceta::Permitir,
        };

        let afip_production = env::var("AFIP_PRODUCTION")
            .map(|v| v == "true")
            .unwrap_or(false);

        let afip = AfipConfig {
            cuit: env::var("AFIP_CUIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            punto_venta: env::var("AFIP_PUNTO_VENTA")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            // 6 = Factura B, 11 = Factura C
            tipo_comprobante: env::var("AFIP_TIPO_COMPROBANTE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(6),
            base_url: env::var("AFIP_URL").unwrap_or_else(|_| {
                if afip_production {
                    AFIP_URL_PRODUCCION.to_string()
                } else {
                    AFIP_URL_HOMOLOGACION.to_string()
                }
            }),
        };

        Self {
            database_url,
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(Vec::new),
            combo_sin_receta,
            afip,
        }
    }
}
