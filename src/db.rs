use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

use crate::afip::AfipClient;
use crate::config::Config;

/// Estado compartido por todos los handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub afip: AfipClient,
    pub config: Config,
}

impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    run_migrations(&db).await?;

    Ok(db)
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS roles (
            id_rol INTEGER PRIMARY KEY AUTOINCREMENT,
            nombre TEXT NOT NULL UNIQUE,
            nivel INTEGER NOT NULL DEFAULT 0
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS sedes (
            id_sede INTEGER PRIMARY KEY AUTOINCREMENT,
            nombre TEXT NOT NULL,
            direccion TEXT,
            activo INTEGER NOT NULL DEFAULT 1
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS usuarios (
            id_usuario INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            nombre TEXT NOT NULL,
            apellido TEXT NOT NULL,
            email TEXT,
            id_rol INTEGER NOT NULL REFERENCES roles(id_rol),
            id_sede INTEGER NOT NULL REFERENCES sedes(id_sede),
            activo INTEGER NOT NULL DEFAULT 1,
            last_login_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS cajas (
            id_caja INTEGER PRIMARY KEY AUTOINCREMENT,
            id_sede INTEGER NOT NULL REFERENCES sedes(id_sede),
            nombre TEXT NOT NULL,
            activo INTEGER NOT NULL DEFAULT 1
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS turnos (
            id_turno INTEGER PRIMARY KEY AUTOINCREMENT,
            id_sede INTEGER NOT NULL REFERENCES sedes(id_sede),
            nombre TEXT NOT NULL,
            hora_inicio TEXT NOT NULL,
            hora_fin TEXT NOT NULL,
            activo INTEGER NOT NULL DEFAULT 1
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS caja_sesiones (
            id_sesion INTEGER PRIMARY KEY AUTOINCREMENT,
            id_sede INTEGER NOT NULL REFERENCES sedes(id_sede),
            id_caja INTEGER NOT NULL REFERENCES cajas(id_caja),
            id_turno INTEGER NOT NULL REFERENCES turnos(id_turno),
            id_usuario_apertura INTEGER NOT NULL REFERENCES usuarios(id_usuario),
            monto_inicial REAL NOT NULL,
            apertura_at TEXT NOT NULL,
            id_usuario_cierre INTEGER REFERENCES usuarios(id_usuario),
            cierre_at TEXT,
            monto_final_declarado REAL,
            observaciones TEXT
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS categorias (
            id_categoria INTEGER PRIMARY KEY AUTOINCREMENT,
            nombre TEXT NOT NULL,
            activo INTEGER NOT NULL DEFAULT 1
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS insumos (
            id_insumo INTEGER PRIMARY KEY AUTOINCREMENT,
            nombre TEXT NOT NULL,
            unidad_medida TEXT NOT NULL DEFAULT 'unidad',
            activo INTEGER NOT NULL DEFAULT 1
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS productos (
            id_producto INTEGER PRIMARY KEY AUTOINCREMENT,
            nombre TEXT NOT NULL,
            id_categoria INTEGER NOT NULL REFERENCES categorias(id_categoria),
            precio REAL NOT NULL,
            tipo TEXT NOT NULL,
            id_insumo_stock INTEGER REFERENCES insumos(id_insumo),
            requiere_comanda INTEGER NOT NULL DEFAULT 0,
            activo INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS producto_items (
            id_item INTEGER PRIMARY KEY AUTOINCREMENT,
            id_producto INTEGER NOT NULL REFERENCES productos(id_producto) ON DELETE CASCADE,
            id_insumo INTEGER NOT NULL REFERENCES insumos(id_insumo),
            cantidad REAL NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS stock_sede (
            id_stock INTEGER PRIMARY KEY AUTOINCREMENT,
            id_sede INTEGER NOT NULL REFERENCES sedes(id_sede),
            id_insumo INTEGER NOT NULL REFERENCES insumos(id_insumo),
            cantidad_actual REAL NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS proveedores (
            id_proveedor INTEGER PRIMARY KEY AUTOINCREMENT,
            nombre TEXT NOT NULL,
            cuit TEXT,
            telefono TEXT,
            email TEXT,
            activo INTEGER NOT NULL DEFAULT 1
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS compras (
            id_compra INTEGER PRIMARY KEY AUTOINCREMENT,
            id_proveedor INTEGER NOT NULL REFERENCES proveedores(id_proveedor),
            id_usuario INTEGER NOT NULL REFERENCES usuarios(id_usuario),
            id_sede INTEGER NOT NULL REFERENCES sedes(id_sede),
            fecha_hora TEXT NOT NULL,
            observacion TEXT,
            estado TEXT NOT NULL DEFAULT 'confirmada',
            created_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS compra_items (
            id_item INTEGER PRIMARY KEY AUTOINCREMENT,
            id_compra INTEGER NOT NULL REFERENCES compras(id_compra) ON DELETE CASCADE,
            id_producto INTEGER NOT NULL REFERENCES productos(id_producto),
            cantidad REAL NOT NULL,
            precio_unitario REAL NOT NULL,
            subtotal REAL NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS ventas (
            id_venta INTEGER PRIMARY KEY AUTOINCREMENT,
            id_sede INTEGER NOT NULL REFERENCES sedes(id_sede),
            id_sesion INTEGER NOT NULL REFERENCES caja_sesiones(id_sesion),
            id_usuario INTEGER NOT NULL REFERENCES usuarios(id_usuario),
            fecha_hora TEXT NOT NULL,
            total_bruto REAL NOT NULL,
            total_neto REAL NOT NULL,
            descuento_total REAL NOT NULL DEFAULT 0,
            forma_pago TEXT NOT NULL,
            estado TEXT NOT NULL,
            cae TEXT,
            cae_vencimiento TEXT,
            nro_comprobante INTEGER,
            punto_venta INTEGER,
            tipo_comprobante INTEGER
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS venta_items (
            id_item INTEGER PRIMARY KEY AUTOINCREMENT,
            id_venta INTEGER NOT NULL REFERENCES ventas(id_venta) ON DELETE CASCADE,
            id_producto INTEGER NOT NULL REFERENCES productos(id_producto),
            cantidad REAL NOT NULL,
            precio_unitario REAL NOT NULL,
            subtotal REAL NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS facturas (
            id_factura INTEGER PRIMARY KEY AUTOINCREMENT,
            id_venta INTEGER NOT NULL UNIQUE REFERENCES ventas(id_venta),
            tipo TEXT NOT NULL,
            punto_venta TEXT NOT NULL,
            numero TEXT NOT NULL,
            cae TEXT NOT NULL,
            vto_cae TEXT NOT NULL,
            estado TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
        // El stock por sede es único por (sede, insumo); los upserts dependen de esto.
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS ux_stock_sede_insumo
        ON stock_sede (id_sede, id_insumo)
        "#,
        // Red de seguridad a nivel storage para los invariantes de sesión:
        // a lo sumo una sesión abierta por caja y por usuario de apertura en cada sede.
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS ux_sesion_abierta_por_caja
        ON caja_sesiones (id_sede, id_caja) WHERE cierre_at IS NULL
        "#,
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS ux_sesion_abierta_por_usuario
        ON caja_sesiones (id_sede, id_usuario_apertura) WHERE cierre_at IS NULL
        "#,
    ];

    for sql in statements {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            sql.to_owned(),
        ))
        .await?;
    }

    Ok(())
}
