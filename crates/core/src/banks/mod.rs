pub mod banks_model;
pub mod banks_traits;

pub use banks_model::{Bank, NewBank};
pub use banks_traits::BankRepositoryTrait;
