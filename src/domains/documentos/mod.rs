pub mod models;
pub mod service;
pub mod storage;

pub use models::*;
pub use service::DocumentoService;
pub use storage::AlmacenDocumentos;
