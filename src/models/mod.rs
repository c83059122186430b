pub mod caja;
pub mod caja_sesion;
pub mod categoria;
pub mod compra;
pub mod compra_item;
pub mod factura;
pub mod insumo;
pub mod producto;
pub mod producto_item;
pub mod proveedor;
pub mod rol;
pub mod sede;
pub mod stock_sede;
pub mod turno;
pub mod usuario;
pub mod venta;
pub mod venta_item;
