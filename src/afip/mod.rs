//! Cliente de facturación electrónica AFIP/ARCA (WSFE).
//!
//! El cliente se construye una vez en el bootstrap a partir de `AfipConfig`
//! y viaja en el `AppState`; los handlers nunca arman uno propio.

mod types;

pub use types::FacturaEmitida;

use chrono::Local;
use std::fmt;

use crate::config::AfipConfig;
use types::{RespuestaCae, RespuestaUltimoComprobante, SolicitudCae, UltimoComprobante, Voucher};

#[derive(Debug)]
pub enum AfipError {
    /// AFIP_CUIT sin configurar: no se puede emitir.
    NoConfigurado,
    /// Falla de red o HTTP no-2xx contra el servicio.
    Http(String),
    /// El servicio respondió pero rechazó el comprobante.
    Rechazado(String),
}

impl fmt::Display for AfipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AfipError::NoConfigurado => write!(f, "AFIP_CUIT no configurado"),
            AfipError::Http(msg) => write!(f, "Error de comunicación con AFIP: {}", msg),
            AfipError::Rechazado(msg) => write!(f, "AFIP rechazó el comprobante: {}", msg),
        }
    }
}

impl std::error::Error for AfipError {}

#[derive(Clone)]
pub struct AfipClient {
    http: reqwest::Client,
    config: AfipConfig,
}

impl AfipClient {
    pub fn new(config: AfipConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { http, config }
    }

    /// Número del último comprobante autorizado para el punto de venta
    /// y tipo configurados.
    pub async fn ultimo_comprobante(&self) -> Result<i64, AfipError> {
        if !self.config.habilitado() {
            return Err(AfipError::NoConfigurado);
        }

        let url = format!("{}/FECompUltimoAutorizado", self.config.base_url);
        let body = UltimoComprobante {
            punto_venta: self.config.punto_venta,
            tipo_comprobante: self.config.tipo_comprobante,
        };

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AfipError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AfipError::Http(format!("status {}", resp.status())));
        }

        let parsed: RespuestaUltimoComprobante = resp
            .json()
            .await
            .map_err(|e| AfipError::Http(e.to_string()))?;

        Ok(parsed.cbte_nro)
    }

    /// Emite una factura por `total` y devuelve el CAE con su vencimiento.
    ///
    /// Para Factura A/B se discrimina IVA 21% del total; la Factura C
    /// (tipo 11) va sin IVA. `doc_nro` es el DNI/CUIT del receptor, 0 y
    /// doc tipo 99 para consumidor final.
    pub async fn crear_factura(
        &self,
        total: f64,
        doc_nro: Option<i64>,
    ) -> Result<FacturaEmitida, AfipError> {
        let ultimo = self.ultimo_comprobante().await?;
        let numero = ultimo + 1;

        let fecha = Local::now();
        let fecha_str = fecha.format("%Y%m%d").to_string();

        let es_factura_c = self.config.tipo_comprobante == 11;
        let (imp_neto, imp_iva, iva) = if es_factura_c {
            (total, 0.0, None)
        } else {
            let neto = total / 1.21;
            let iva_importe = total - neto;
            (
                neto,
                iva_importe,
                Some(vec![types::AlicuotaIva {
                    // 5 = IVA 21%
                    id: 5,
                    base_imp: redondear(neto),
                    importe: redondear(iva_importe),
                }]),
            )
        };

        let voucher = Voucher {
            cant_reg: 1,
            punto_venta: self.config.punto_venta,
            tipo_comprobante: self.config.tipo_comprobante,
            // 1 = productos
            concepto: 1,
            doc_tipo: if doc_nro.is_some() { 96 } else { 99 },
            doc_nro: doc_nro.unwrap_or(0),
            cbte_desde: numero,
            cbte_hasta: numero,
            cbte_fch: fecha_str.clone(),
            imp_total: redondear(total),
            imp_tot_conc: 0.0,
            imp_neto: redondear(imp_neto),
            imp_op_ex: 0.0,
            imp_iva: redondear(imp_iva),
            imp_trib: 0.0,
            mon_id: "PES".to_string(),
            mon_cotiz: 1.0,
            condicion_iva_receptor_id: 5,
            iva,
        };

        tracing::info!(
            total,
            numero,
            punto_venta = self.config.punto_venta,
            "Solicitando CAE a AFIP"
        );

        let url = format!("{}/FECAESolicitar", self.config.base_url);
        let body = SolicitudCae { cuit: self.config.cuit, voucher };

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AfipError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AfipError::Http(format!("status {}", resp.status())));
        }

        let parsed: RespuestaCae = resp
            .json()
            .await
            .map_err(|e| AfipError::Http(e.to_string()))?;

        match parsed.cae {
            Some(cae) if !cae.is_empty() => {
                tracing::info!(%cae, "Factura autorizada");
                Ok(FacturaEmitida {
                    cae,
                    cae_vencimiento: fecha_afip_a_iso(&parsed.cae_fch_vto.unwrap_or_default()),
                    numero_comprobante: numero,
                    tipo_comprobante: self.config.tipo_comprobante,
                    punto_venta: self.config.punto_venta,
                    fecha_emision: fecha_afip_a_iso(&fecha_str),
                })
            }
            _ => {
                let detalle = parsed
                    .observaciones
                    .unwrap_or_default()
                    .into_iter()
                    .map(|o| o.msg)
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(AfipError::Rechazado(if detalle.is_empty() {
                    "sin CAE en la respuesta".to_string()
                } else {
                    detalle
                }))
            }
        }
    }
}

fn redondear(valor: f64) -> f64 {
    (valor * 100.0).round() / 100.0
}

/// YYYYMMDD -> YYYY-MM-DD. Cualquier otra cosa pasa sin tocar.
fn fecha_afip_a_iso(fecha: &str) -> String {
    if fecha.len() == 8 && fecha.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &fecha[0..4], &fecha[4..6], &fecha[6..8])
    } else {
        fecha.to_string()
    }
}
