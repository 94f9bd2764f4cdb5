pub mod service;

pub use service::{agente_id_por_nombre, formapago_id_por_nombre, CatalogoService};
