use serde::{Deserialize, Serialize};

/// Comprobante según la estructura WSFE de AFIP.
#[derive(Debug, Serialize)]
pub struct Voucher {
    #[serde(rename = "CantReg")]
    pub cant_reg: i32,
    #[serde(rename = "PtoVta")]
    pub punto_venta: i32,
    #[serde(rename = "CbteTipo")]
    pub tipo_comprobante: i32,
    #[serde(rename = "Concepto")]
    pub concepto: i32,
    #[serde(rename = "DocTipo")]
    pub doc_tipo: i32,
    #[serde(rename = "DocNro")]
    pub doc_nro: i64,
    #[serde(rename = "CbteDesde")]
    pub cbte_desde: i64,
    #[serde(rename = "CbteHasta")]
    pub cbte_hasta: i64,
    #[serde(rename = "CbteFch")]
    pub cbte_fch: String,
    #[serde(rename = "ImpTotal")]
    pub imp_total: f64,
    #[serde(rename = "ImpTotConc")]
    pub imp_tot_conc: f64,
    #[serde(rename = "ImpNeto")]
    pub imp_neto: f64,
    #[serde(rename = "ImpOpEx")]
    pub imp_op_ex: f64,
    #[serde(rename = "ImpIVA")]
    pub imp_iva: f64,
    #[serde(rename = "ImpTrib")]
    pub imp_trib: f64,
    #[serde(rename = "MonId")]
    pub mon_id: String,
    #[serde(rename = "MonCotiz")]
    pub mon_cotiz: f64,
    #[serde(rename = "CondicionIVAReceptorId")]
    pub condicion_iva_receptor_id: i32,
    #[serde(rename = "Iva", skip_serializing_if = "Option::is_none")]
    pub iva: Option<Vec<AlicuotaIva>>,
}

#[derive(Debug, Serialize)]
pub struct AlicuotaIva {
    #[serde(rename = "Id")]
    pub id: i32,
    #[serde(rename = "BaseImp")]
    pub base_imp: f64,
    #[serde(rename = "Importe")]
    pub importe: f64,
}

#[derive(Debug, Serialize)]
pub struct UltimoComprobante {
    #[serde(rename = "PtoVta")]
    pub punto_venta: i32,
    #[serde(rename = "CbteTipo")]
    pub tipo_comprobante: i32,
}

#[derive(Debug, Deserialize)]
pub struct RespuestaUltimoComprobante {
    #[serde(rename = "CbteNro")]
    pub cbte_nro: i64,
}

#[derive(Debug, Serialize)]
pub struct SolicitudCae {
    #[serde(rename = "Cuit")]
    pub cuit: i64,
    #[serde(rename = "FeDetReq")]
    pub voucher: Voucher,
}

#[derive(Debug, Deserialize)]
pub struct RespuestaCae {
    #[serde(rename = "CAE")]
    pub cae: Option<String>,
    #[serde(rename = "CAEFchVto")]
    pub cae_fch_vto: Option<String>,
    #[serde(rename = "Observaciones", default)]
    pub observaciones: Option<Vec<Observacion>>,
}

#[derive(Debug, Deserialize)]
pub struct Observacion {
    #[serde(rename = "Msg")]
    pub msg: String,
}

/// Resultado de una emisión exitosa, tal como se persiste sobre la venta.
#[derive(Debug, Clone, Serialize)]
pub struct FacturaEmitida {
    pub cae: String,
    /// YYYY-MM-DD
    pub cae_vencimiento: String,
    pub numero_comprobante: i64,
    pub tipo_comprobante: i32,
    pub punto_venta: i32,
    pub fecha_emision: String,
}
