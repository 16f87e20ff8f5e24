pub mod clients_model;
pub mod clients_service;
pub mod clients_traits;

pub use clients_model::{mask_document, Client, ClientUpdate, NewClient};
pub use clients_service::ClientService;
pub use clients_traits::ClientRepositoryTrait;
