use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use maxikiosco::afip::AfipClient;
use maxikiosco::config::{AfipConfig, PoliticaComboSinReceta};
use maxikiosco::db;
use maxikiosco::models::{
    caja, categoria, factura, insumo, producto, producto_item, rol, sede, stock_sede, turno,
    usuario, venta, venta_item,
};
use maxikiosco::services::caja_service::{self, AbrirSesionInput};
use maxikiosco::services::venta_service::{self, CrearVentaInput, ItemVenta};
use maxikiosco::services::ServiceError;

async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

fn afip_sin_servicio() -> AfipClient {
    // CUIT configurado pero URL inalcanzable: si alguien lo llama, falla.
    AfipClient::new(AfipConfig {
        cuit: 20111111112,
        punto_venta: 1,
        tipo_comprobante: 6,
        base_url: "http://127.0.0.1:9".to_string(),
    })
}

fn afip_contra(mock_server: &MockServer) -> AfipClient {
    AfipClient::new(AfipConfig {
        cuit: 20111111112,
        punto_venta: 1,
        tipo_comprobante: 6,
        base_url: mock_server.uri(),
    })
}

struct Escenario {
    id_sede: i32,
    id_usuario: i32,
    id_insumo_pan: i32,
    id_producto_combo: i32,
}

/// Sede con caja y turno, un cajero con sesión abierta, y un sándwich
/// (combo) que consume 2 de pan por unidad.
async fn armar_escenario(db: &DatabaseConnection, stock_pan: f64) -> Escenario {
    let now = chrono::Utc::now().to_rfc3339();

    let sede = sede::ActiveModel {
        nombre: Set("Central".to_string()),
        direccion: Set(None),
        activo: Set(true),
        ..Default::default()
    };
    let id_sede = sede::Entity::insert(sede).exec(db).await.unwrap().last_insert_id;

    let rol_cajero = rol::ActiveModel {
        nombre: Set("cajero".to_string()),
        nivel: Set(1),
        ..Default::default()
    };
    let id_rol = rol::Entity::insert(rol_cajero).exec(db).await.unwrap().last_insert_id;

    let cajero = usuario::ActiveModel {
        username: Set("cajero1".to_string()),
        password_hash: Set("hash".to_string()),
        nombre: Set("Carla".to_string()),
        apellido: Set("Gómez".to_string()),
        email: Set(None),
        id_rol: Set(id_rol),
        id_sede: Set(id_sede),
        activo: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    };
    let id_usuario = usuario::Entity::insert(cajero).exec(db).await.unwrap().last_insert_id;

    let caja_row = caja::ActiveModel {
        id_sede: Set(id_sede),
        nombre: Set("Caja 1".to_string()),
        activo: Set(true),
        ..Default::default()
    };
    let id_caja = caja::Entity::insert(caja_row).exec(db).await.unwrap().last_insert_id;

    let turno_row = turno::ActiveModel {
        id_sede: Set(id_sede),
        nombre: Set("Mañana".to_string()),
        hora_inicio: Set("06:00:00".to_string()),
        hora_fin: Set("14:00:00".to_string()),
        activo: Set(true),
        ..Default::default()
    };
    let id_turno = turno::Entity::insert(turno_row).exec(db).await.unwrap().last_insert_id;

    caja_service::abrir_sesion(
        db,
        id_usuario,
        AbrirSesionInput {
            id_caja,
            id_turno,
            monto_inicial: 1000.0,
            id_sede,
        },
    )
    .await
    .expect("Failed to open session");

    let cat = categoria::ActiveModel {
        nombre: Set("Comidas".to_string()),
        activo: Set(true),
        ..Default::default()
    };
    let id_categoria = categoria::Entity::insert(cat).exec(db).await.unwrap().last_insert_id;

    let pan = insumo::ActiveModel {
        nombre: Set("Pan".to_string()),
        unidad_medida: Set("unidad".to_string()),
        activo: Set(true),
        ..Default::default()
    };
    let id_insumo_pan = insumo::Entity::insert(pan).exec(db).await.unwrap().last_insert_id;

    let combo = producto::ActiveModel {
        nombre: Set("Sándwich".to_string()),
        id_categoria: Set(id_categoria),
        precio: Set(3500.0),
        tipo: Set(producto::TIPO_COMBO.to_string()),
        id_insumo_stock: Set(None),
        requiere_comanda: Set(true),
        activo: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    };
    let id_producto_combo = producto::Entity::insert(combo).exec(db).await.unwrap().last_insert_id;

    let receta = producto_item::ActiveModel {
        id_producto: Set(id_producto_combo),
        id_insumo: Set(id_insumo_pan),
        cantidad: Set(2.0),
        ..Default::default()
    };
    producto_item::Entity::insert(receta).exec(db).await.unwrap();

    let stock = stock_sede::ActiveModel {
        id_sede: Set(id_sede),
        id_insumo: Set(id_insumo_pan),
        cantidad_actual: Set(stock_pan),
        updated_at: Set(now),
        ..Default::default()
    };
    stock_sede::Entity::insert(stock).exec(db).await.unwrap();

    Escenario {
        id_sede,
        id_usuario,
        id_insumo_pan,
        id_producto_combo,
    }
}

fn pedido(esc: &Escenario, cantidad: f64, forma_pago: &str) -> CrearVentaInput {
    CrearVentaInput {
        items: vec![ItemVenta {
            id_producto: esc.id_producto_combo,
            cantidad,
            precio_unitario: 3500.0,
        }],
        forma_pago: forma_pago.to_string(),
        id_sede: esc.id_sede,
    }
}

async fn stock_actual(db: &DatabaseConnection, esc: &Escenario) -> f64 {
    stock_sede::Entity::find()
        .filter(stock_sede::Column::IdSede.eq(esc.id_sede))
        .filter(stock_sede::Column::IdInsumo.eq(esc.id_insumo_pan))
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .cantidad_actual
}

#[tokio::test]
async fn rechaza_venta_con_stock_insuficiente() {
    let db = setup_test_db().await;
    let esc = armar_escenario(&db, 5.0).await;

    // 3 sándwiches piden 6 de pan y hay 5
    let res = venta_service::crear_venta(
        &db,
        &afip_sin_servicio(),
        PoliticaComboSinReceta::Permitir,
        esc.id_usuario,
        pedido(&esc, 3.0, venta::FORMA_PAGO_EFECTIVO),
    )
    .await;

    match res {
        Err(ServiceError::StockInsuficiente {
            insumo,
            requerido,
            disponible,
        }) => {
            assert_eq!(insumo, "Pan");
            assert_eq!(requerido, 6.0);
            assert_eq!(disponible, 5.0);
        }
        other => panic!("Expected StockInsuficiente, got {:?}", other),
    }

    // Nada quedó registrado y el stock no se tocó
    assert_eq!(venta::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(stock_actual(&db, &esc).await, 5.0);
}

#[tokio::test]
async fn venta_de_combo_descuenta_stock_por_receta() {
    let db = setup_test_db().await;
    let esc = armar_escenario(&db, 5.0).await;

    let res = venta_service::crear_venta(
        &db,
        &afip_sin_servicio(),
        PoliticaComboSinReceta::Permitir,
        esc.id_usuario,
        pedido(&esc, 2.0, venta::FORMA_PAGO_EFECTIVO),
    )
    .await
    .expect("Sale should succeed");

    assert_eq!(res.total, 7000.0);
    assert!(res.es_comanda);
    assert!(res.factura.is_none());
    assert_eq!(stock_actual(&db, &esc).await, 1.0);

    let guardada = venta::Entity::find_by_id(res.id_venta)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(guardada.estado, venta::ESTADO_PAGADA);
    assert_eq!(guardada.forma_pago, venta::FORMA_PAGO_EFECTIVO);
    assert!(guardada.cae.is_none());

    assert_eq!(
        venta_item::Entity::find()
            .filter(venta_item::Column::IdVenta.eq(res.id_venta))
            .count(&db)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn rechaza_venta_sin_sesion_abierta() {
    let db = setup_test_db().await;
    let esc = armar_escenario(&db, 5.0).await;

    // Otro usuario, sin sesión
    let res = venta_service::crear_venta(
        &db,
        &afip_sin_servicio(),
        PoliticaComboSinReceta::Permitir,
        esc.id_usuario + 100,
        pedido(&esc, 1.0, venta::FORMA_PAGO_EFECTIVO),
    )
    .await;

    match res {
        Err(ServiceError::Conflicto(msg)) => {
            assert_eq!(msg, "No tenés una caja abierta. Abrí la caja antes de vender.")
        }
        other => panic!("Expected Conflicto, got {:?}", other),
    }
}

#[tokio::test]
async fn transferencia_emite_factura_con_cae() {
    let db = setup_test_db().await;
    let esc = armar_escenario(&db, 10.0).await;

    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/FECompUltimoAutorizado"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "CbteNro": 41 })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/FECAESolicitar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "CAE": "75123456789012",
            "CAEFchVto": "20260901"
        })))
        .mount(&mock_server)
        .await;

    let res = venta_service::crear_venta(
        &db,
        &afip_contra(&mock_server),
        PoliticaComboSinReceta::Permitir,
        esc.id_usuario,
        pedido(&esc, 1.0, venta::FORMA_PAGO_TRANSFERENCIA),
    )
    .await
    .expect("Sale with invoice should succeed");

    assert!(!res.es_comanda);
    let emitida = res.factura.expect("Expected an invoice");
    assert_eq!(emitida.cae, "75123456789012");
    assert_eq!(emitida.numero_comprobante, 42);
    assert_eq!(emitida.cae_vencimiento, "2026-09-01");

    let guardada = venta::Entity::find_by_id(res.id_venta)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(guardada.cae.as_deref(), Some("75123456789012"));
    assert_eq!(guardada.nro_comprobante, Some(42));

    let factura_row = factura::Entity::find()
        .filter(factura::Column::IdVenta.eq(res.id_venta))
        .one(&db)
        .await
        .unwrap()
        .expect("Expected a facturas row");
    assert_eq!(factura_row.estado, "aprobada");
    assert_eq!(factura_row.numero, "42");
}

#[tokio::test]
async fn falla_de_afip_revierte_la_venta_completa() {
    let db = setup_test_db().await;
    let esc = armar_escenario(&db, 10.0).await;

    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/FECompUltimoAutorizado"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "CbteNro": 41 })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/FECAESolicitar"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let res = venta_service::crear_venta(
        &db,
        &afip_contra(&mock_server),
        PoliticaComboSinReceta::Permitir,
        esc.id_usuario,
        pedido(&esc, 1.0, venta::FORMA_PAGO_DEBITO),
    )
    .await;

    assert!(matches!(res, Err(ServiceError::Upstream(_))));

    // Rollback total: ni venta, ni items, ni descuento de stock
    assert_eq!(venta::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(venta_item::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(factura::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(stock_actual(&db, &esc).await, 10.0);
}

#[tokio::test]
async fn combo_sin_receta_respeta_la_politica() {
    let db = setup_test_db().await;
    let esc = armar_escenario(&db, 5.0).await;
    let now = chrono::Utc::now().to_rfc3339();

    let combo_vacio = producto::ActiveModel {
        nombre: Set("Promo misteriosa".to_string()),
        id_categoria: Set(1),
        precio: Set(2000.0),
        tipo: Set(producto::TIPO_COMBO.to_string()),
        id_insumo_stock: Set(None),
        requiere_comanda: Set(false),
        activo: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let id_combo_vacio = producto::Entity::insert(combo_vacio)
        .exec(&db)
        .await
        .unwrap()
        .last_insert_id;

    let input = CrearVentaInput {
        items: vec![ItemVenta {
            id_producto: id_combo_vacio,
            cantidad: 1.0,
            precio_unitario: 2000.0,
        }],
        forma_pago: venta::FORMA_PAGO_EFECTIVO.to_string(),
        id_sede: esc.id_sede,
    };

    let rechazo = venta_service::crear_venta(
        &db,
        &afip_sin_servicio(),
        PoliticaComboSinReceta::Rechazar,
        esc.id_usuario,
        input.clone(),
    )
    .await;
    match rechazo {
        Err(ServiceError::Conflicto(msg)) => assert!(msg.contains("no tiene receta")),
        other => panic!("Expected Conflicto, got {:?}", other),
    }

    let permitida = venta_service::crear_venta(
        &db,
        &afip_sin_servicio(),
        PoliticaComboSinReceta::Permitir,
        esc.id_usuario,
        input,
    )
    .await
    .expect("Permissive policy should accept the sale");
    assert_eq!(permitida.total, 2000.0);
    // Sin receta no hay nada que descontar
    assert_eq!(stock_actual(&db, &esc).await, 5.0);
}

#[tokio::test]
async fn no_se_factura_dos_veces_la_misma_venta() {
    let db = setup_test_db().await;
    let esc = armar_escenario(&db, 10.0).await;

    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/FECompUltimoAutorizado"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "CbteNro": 7 })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/FECAESolicitar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "CAE": "75999999999999",
            "CAEFchVto": "20261001"
        })))
        .mount(&mock_server)
        .await;
    let afip = afip_contra(&mock_server);

    // Venta en efectivo: sale como comanda, sin factura
    let venta_creada = venta_service::crear_venta(
        &db,
        &afip,
        PoliticaComboSinReceta::Permitir,
        esc.id_usuario,
        pedido(&esc, 1.0, venta::FORMA_PAGO_EFECTIVO),
    )
    .await
    .unwrap();
    assert!(venta_creada.factura.is_none());

    // Facturación a posteriori
    let emitida = venta_service::facturar_venta(&db, &afip, venta_creada.id_venta, None)
        .await
        .expect("Post-hoc invoicing should succeed");
    assert_eq!(emitida.numero_comprobante, 8);

    let repetida = venta_service::facturar_venta(&db, &afip, venta_creada.id_venta, None).await;
    match repetida {
        Err(ServiceError::Conflicto(msg)) => assert_eq!(msg, "Esta venta ya fue facturada"),
        other => panic!("Expected Conflicto, got {:?}", other),
    }
}
