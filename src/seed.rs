//! Datos de demo para levantar el sistema de cero: una sede con su caja,
//! turnos, un admin y un cajero, y un catálogo mínimo con un combo.

use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::auth::hash_password;
use crate::models::{
    caja, categoria, insumo, producto, producto_item, rol, sede, stock_sede, turno, usuario,
};

pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = chrono::Utc::now().to_rfc3339();

    // Roles
    for (nombre, nivel) in [("cajero", 1), ("encargado", 2), ("admin", 3), ("superadmin", 4)] {
        let nuevo = rol::ActiveModel {
            nombre: Set(nombre.to_owned()),
            nivel: Set(nivel),
            ..Default::default()
        };
        rol::Entity::insert(nuevo)
            .on_conflict(
                OnConflict::column(rol::Column::Nombre)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(db)
            .await?;
    }

    if sede::Entity::find().one(db).await?.is_some() {
        // Base ya sembrada
        return Ok(());
    }

    let sede_central = sede::ActiveModel {
        nombre: Set("Casa Central".to_owned()),
        direccion: Set(Some("Av. San Martín 1200".to_owned())),
        activo: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let caja_principal = caja::ActiveModel {
        id_sede: Set(sede_central.id_sede),
        nombre: Set("Caja 1".to_owned()),
        activo: Set(true),
        ..Default::default()
    };
    caja_principal.insert(db).await?;

    for (nombre, inicio, fin) in [
        ("Mañana", "06:00:00", "14:00:00"),
        ("Tarde", "14:00:00", "22:00:00"),
    ] {
        turno::ActiveModel {
            id_sede: Set(sede_central.id_sede),
            nombre: Set(nombre.to_owned()),
            hora_inicio: Set(inicio.to_owned()),
            hora_fin: Set(fin.to_owned()),
            activo: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    let rol_admin = rol::Entity::find()
        .filter(rol::Column::Nombre.eq("admin"))
        .one(db)
        .await?
        .expect("rol admin sembrado arriba");
    let rol_cajero = rol::Entity::find()
        .filter(rol::Column::Nombre.eq("cajero"))
        .one(db)
        .await?
        .expect("rol cajero sembrado arriba");

    for (username, password, nombre, apellido, id_rol) in [
        ("admin", "admin", "Admin", "Principal", rol_admin.id_rol),
        ("cajero1", "cajero1", "Carla", "Gómez", rol_cajero.id_rol),
    ] {
        let hash = hash_password(password).expect("hash de password de demo");
        let nuevo = usuario::ActiveModel {
            username: Set(username.to_owned()),
            password_hash: Set(hash),
            nombre: Set(nombre.to_owned()),
            apellido: Set(apellido.to_owned()),
            email: Set(None),
            id_rol: Set(id_rol),
            id_sede: Set(sede_central.id_sede),
            activo: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };
        usuario::Entity::insert(nuevo)
            .on_conflict(
                OnConflict::column(usuario::Column::Username)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(db)
            .await?;
    }

    let cat_kiosco = categoria::ActiveModel {
        nombre: Set("Kiosco".to_owned()),
        activo: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await?;
    let cat_comidas = categoria::ActiveModel {
        nombre: Set("Comidas".to_owned()),
        activo: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let insumo_pan = insumo::ActiveModel {
        nombre: Set("Pan".to_owned()),
        unidad_medida: Set("unidad".to_owned()),
        activo: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await?;
    let insumo_jamon = insumo::ActiveModel {
        nombre: Set("Jamón".to_owned()),
        unidad_medida: Set("kg".to_owned()),
        activo: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await?;
    let insumo_gaseosa = insumo::ActiveModel {
        nombre: Set("Gaseosa 500ml".to_owned()),
        unidad_medida: Set("unidad".to_owned()),
        activo: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await?;

    producto::ActiveModel {
        nombre: Set("Gaseosa 500ml".to_owned()),
        id_categoria: Set(cat_kiosco.id_categoria),
        precio: Set(1500.0),
        tipo: Set(producto::TIPO_KIOSCO.to_owned()),
        id_insumo_stock: Set(Some(insumo_gaseosa.id_insumo)),
        requiere_comanda: Set(false),
        activo: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let combo_sandwich = producto::ActiveModel {
        nombre: Set("Sándwich de jamón".to_owned()),
        id_categoria: Set(cat_comidas.id_categoria),
        precio: Set(3500.0),
        tipo: Set(producto::TIPO_COMBO.to_owned()),
        id_insumo_stock: Set(None),
        requiere_comanda: Set(true),
        activo: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for (id_insumo, cantidad) in [(insumo_pan.id_insumo, 2.0), (insumo_jamon.id_insumo, 0.05)] {
        producto_item::ActiveModel {
            id_producto: Set(combo_sandwich.id_producto),
            id_insumo: Set(id_insumo),
            cantidad: Set(cantidad),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    for (id_insumo, cantidad) in [
        (insumo_pan.id_insumo, 50.0),
        (insumo_jamon.id_insumo, 2.0),
        (insumo_gaseosa.id_insumo, 24.0),
    ] {
        stock_sede::ActiveModel {
            id_sede: Set(sede_central.id_sede),
            id_insumo: Set(id_insumo),
            cantidad_actual: Set(cantidad),
            updated_at: Set(now.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}
