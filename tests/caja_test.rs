use sea_orm::{DatabaseConnection, EntityTrait, Set};

use maxikiosco::db;
use maxikiosco::models::{caja, caja_sesion, rol, sede, turno, usuario, venta};
use maxikiosco::services::caja_service::{self, AbrirSesionInput};
use maxikiosco::services::ServiceError;

async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

struct Sucursal {
    id_sede: i32,
    id_caja: i32,
    id_caja_2: i32,
    id_turno: i32,
    id_cajero: i32,
    id_cajero_2: i32,
}

async fn armar_sucursal(db: &DatabaseConnection) -> Sucursal {
    let now = chrono::Utc::now().to_rfc3339();

    let id_sede = sede::Entity::insert(sede::ActiveModel {
        nombre: Set("Central".to_string()),
        direccion: Set(None),
        activo: Set(true),
        ..Default::default()
    })
    .exec(db)
    .await
    .unwrap()
    .last_insert_id;

    let id_rol = rol::Entity::insert(rol::ActiveModel {
        nombre: Set("cajero".to_string()),
        nivel: Set(1),
        ..Default::default()
    })
    .exec(db)
    .await
    .unwrap()
    .last_insert_id;

    let mut cajeros = Vec::new();
    for username in ["cajero1", "cajero2"] {
        let id = usuario::Entity::insert(usuario::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set("hash".to_string()),
            nombre: Set("Test".to_string()),
            apellido: Set("Cajero".to_string()),
            email: Set(None),
            id_rol: Set(id_rol),
            id_sede: Set(id_sede),
            activo: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        })
        .exec(db)
        .await
        .unwrap()
        .last_insert_id;
        cajeros.push(id);
    }

    let mut cajas = Vec::new();
    for nombre in ["Caja 1", "Caja 2"] {
        let id = caja::Entity::insert(caja::ActiveModel {
            id_sede: Set(id_sede),
            nombre: Set(nombre.to_string()),
            activo: Set(true),
            ..Default::default()
        })
        .exec(db)
        .await
        .unwrap()
        .last_insert_id;
        cajas.push(id);
    }

    let id_turno = turno::Entity::insert(turno::ActiveModel {
        id_sede: Set(id_sede),
        nombre: Set("Mañana".to_string()),
        hora_inicio: Set("06:00:00".to_string()),
        hora_fin: Set("14:00:00".to_string()),
        activo: Set(true),
        ..Default::default()
    })
    .exec(db)
    .await
    .unwrap()
    .last_insert_id;

    Sucursal {
        id_sede,
        id_caja: cajas[0],
        id_caja_2: cajas[1],
        id_turno,
        id_cajero: cajeros[0],
        id_cajero_2: cajeros[1],
    }
}

fn apertura(suc: &Sucursal, id_caja: i32, monto_inicial: f64) -> AbrirSesionInput {
    AbrirSesionInput {
        id_caja,
        id_turno: suc.id_turno,
        monto_inicial,
        id_sede: suc.id_sede,
    }
}

#[tokio::test]
async fn abre_sesion_con_nombres_de_caja_y_turno() {
    let db = setup_test_db().await;
    let suc = armar_sucursal(&db).await;

    let sesion = caja_service::abrir_sesion(&db, suc.id_cajero, apertura(&suc, suc.id_caja, 1000.0))
        .await
        .expect("Opening should succeed");

    assert_eq!(sesion.caja_nombre, "Caja 1");
    assert_eq!(sesion.turno_nombre, "Mañana");
    assert_eq!(sesion.sesion.monto_inicial, 1000.0);
    assert!(sesion.sesion.cierre_at.is_none());
}

#[tokio::test]
async fn rechaza_monto_inicial_negativo() {
    let db = setup_test_db().await;
    let suc = armar_sucursal(&db).await;

    let res =
        caja_service::abrir_sesion(&db, suc.id_cajero, apertura(&suc, suc.id_caja, -1.0)).await;
    assert!(matches!(res, Err(ServiceError::Validacion(_))));
}

#[tokio::test]
async fn rechaza_segunda_sesion_en_la_misma_caja() {
    let db = setup_test_db().await;
    let suc = armar_sucursal(&db).await;

    caja_service::abrir_sesion(&db, suc.id_cajero, apertura(&suc, suc.id_caja, 500.0))
        .await
        .unwrap();

    // Otro cajero intenta la misma caja
    let res =
        caja_service::abrir_sesion(&db, suc.id_cajero_2, apertura(&suc, suc.id_caja, 500.0)).await;
    match res {
        Err(ServiceError::Conflicto(msg)) => {
            assert_eq!(msg, "Ya existe una sesión abierta en esta caja")
        }
        other => panic!("Expected Conflicto, got {:?}", other),
    }
}

#[tokio::test]
async fn rechaza_segunda_sesion_del_mismo_operador() {
    let db = setup_test_db().await;
    let suc = armar_sucursal(&db).await;

    caja_service::abrir_sesion(&db, suc.id_cajero, apertura(&suc, suc.id_caja, 500.0))
        .await
        .unwrap();

    // El mismo cajero intenta otra caja
    let res =
        caja_service::abrir_sesion(&db, suc.id_cajero, apertura(&suc, suc.id_caja_2, 500.0)).await;
    match res {
        Err(ServiceError::Conflicto(msg)) => {
            assert_eq!(msg, "Ya tenés una sesión abierta. Cerrá la anterior primero.")
        }
        other => panic!("Expected Conflicto, got {:?}", other),
    }
}

async fn registrar_venta_pagada(db: &DatabaseConnection, suc: &Sucursal, id_sesion: i32, total: f64) {
    venta::Entity::insert(venta::ActiveModel {
        id_sede: Set(suc.id_sede),
        id_sesion: Set(id_sesion),
        id_usuario: Set(suc.id_cajero),
        fecha_hora: Set(chrono::Utc::now().to_rfc3339()),
        total_bruto: Set(total),
        total_neto: Set(total),
        descuento_total: Set(0.0),
        forma_pago: Set(venta::FORMA_PAGO_EFECTIVO.to_string()),
        estado: Set(venta::ESTADO_PAGADA.to_string()),
        ..Default::default()
    })
    .exec(db)
    .await
    .unwrap();
}

#[tokio::test]
async fn cierre_calcula_arqueo_y_diferencia() {
    let db = setup_test_db().await;
    let suc = armar_sucursal(&db).await;

    let sesion = caja_service::abrir_sesion(&db, suc.id_cajero, apertura(&suc, suc.id_caja, 1000.0))
        .await
        .unwrap();
    let id_sesion = sesion.sesion.id_sesion;

    registrar_venta_pagada(&db, &suc, id_sesion, 300.0).await;
    registrar_venta_pagada(&db, &suc, id_sesion, 200.0).await;

    // Esperado 1500, declarado 1480: faltan 20
    let cierre = caja_service::cerrar_sesion(&db, suc.id_cajero, id_sesion, 1480.0, None)
        .await
        .expect("Close should succeed");

    assert_eq!(cierre.monto_real_calculado, 1500.0);
    assert_eq!(cierre.monto_declarado, 1480.0);
    assert_eq!(cierre.diferencia, -20.0);
    assert_eq!(cierre.total_ventas, 500.0);
    assert_eq!(cierre.cantidad_ventas, 2);
    assert!(cierre.sesion.cierre_at.is_some());
    assert_eq!(cierre.sesion.monto_final_declarado, Some(1480.0));

    // La sesión deja de estar activa
    let activa = caja_service::sesion_activa(&db, suc.id_cajero, suc.id_sede)
        .await
        .unwrap();
    assert!(activa.is_none());
}

#[tokio::test]
async fn solo_quien_abrio_puede_cerrar() {
    let db = setup_test_db().await;
    let suc = armar_sucursal(&db).await;

    let sesion = caja_service::abrir_sesion(&db, suc.id_cajero, apertura(&suc, suc.id_caja, 500.0))
        .await
        .unwrap();

    let res =
        caja_service::cerrar_sesion(&db, suc.id_cajero_2, sesion.sesion.id_sesion, 500.0, None)
            .await;
    match res {
        Err(ServiceError::NoAutorizado(msg)) => {
            assert_eq!(msg, "Solo podés cerrar tu propia sesión")
        }
        other => panic!("Expected NoAutorizado, got {:?}", other),
    }
}

#[tokio::test]
async fn no_se_cierra_dos_veces() {
    let db = setup_test_db().await;
    let suc = armar_sucursal(&db).await;

    let sesion = caja_service::abrir_sesion(&db, suc.id_cajero, apertura(&suc, suc.id_caja, 500.0))
        .await
        .unwrap();
    let id_sesion = sesion.sesion.id_sesion;

    caja_service::cerrar_sesion(&db, suc.id_cajero, id_sesion, 500.0, None)
        .await
        .unwrap();

    let res = caja_service::cerrar_sesion(&db, suc.id_cajero, id_sesion, 500.0, None).await;
    match res {
        Err(ServiceError::Conflicto(msg)) => assert_eq!(msg, "Esta sesión ya está cerrada"),
        other => panic!("Expected Conflicto, got {:?}", other),
    }
}

#[tokio::test]
async fn cerrar_sesion_inexistente_es_not_found() {
    let db = setup_test_db().await;
    let suc = armar_sucursal(&db).await;

    let res = caja_service::cerrar_sesion(&db, suc.id_cajero, 999, 100.0, None).await;
    assert!(matches!(res, Err(ServiceError::NotFound)));
}

#[tokio::test]
async fn opciones_marca_cajas_ocupadas() {
    let db = setup_test_db().await;
    let suc = armar_sucursal(&db).await;

    caja_service::abrir_sesion(&db, suc.id_cajero, apertura(&suc, suc.id_caja, 500.0))
        .await
        .unwrap();

    let opciones = caja_service::opciones(&db, suc.id_sede).await.unwrap();
    assert_eq!(opciones.cajas.len(), 2);
    assert_eq!(opciones.turnos.len(), 1);

    let ocupada = opciones
        .cajas
        .iter()
        .find(|c| c.caja.id_caja == suc.id_caja)
        .unwrap();
    let libre = opciones
        .cajas
        .iter()
        .find(|c| c.caja.id_caja == suc.id_caja_2)
        .unwrap();
    assert!(ocupada.tiene_sesion_abierta);
    assert!(!libre.tiene_sesion_abierta);
}

#[tokio::test]
async fn tras_cerrar_se_puede_reabrir_la_caja() {
    let db = setup_test_db().await;
    let suc = armar_sucursal(&db).await;

    let primera =
        caja_service::abrir_sesion(&db, suc.id_cajero, apertura(&suc, suc.id_caja, 500.0))
            .await
            .unwrap();
    caja_service::cerrar_sesion(&db, suc.id_cajero, primera.sesion.id_sesion, 500.0, None)
        .await
        .unwrap();

    let segunda =
        caja_service::abrir_sesion(&db, suc.id_cajero, apertura(&suc, suc.id_caja, 700.0))
            .await
            .expect("Reopening after close should succeed");
    assert_ne!(segunda.sesion.id_sesion, primera.sesion.id_sesion);

    // La sesión cerrada queda en el historial
    let historicas = caja_sesion::Entity::find().all(&db).await.unwrap();
    assert_eq!(historicas.len(), 2);
}
