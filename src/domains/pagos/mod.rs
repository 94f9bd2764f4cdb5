pub mod filters;
pub mod models;
pub mod nota_credito;
pub mod service;

pub use models::*;
pub use service::PagoService;
