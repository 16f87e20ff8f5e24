//! Repository trait for banks.

use async_trait::async_trait;

use crate::banks::banks_model::{Bank, NewBank};
use crate::errors::Result;

#[async_trait]
pub trait BankRepositoryTrait: Send + Sync {
    fn get_bank_by_id(&self, bank_id: &str) -> Result<Option<Bank>>;

    fn list_banks(&self) -> Result<Vec<Bank>>;

    async fn create_bank(&self, new_bank: NewBank) -> Result<Bank>;
}
