use async_trait::async_trait;

use crate::domain::entities::record::Address;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("CEP deve ter 8 dígitos.")]
    InvalidInput,
    #[error("CEP não encontrado no ViaCEP.")]
    NotFound,
    #[error("{0}")]
    LookupFailed(String),
}

#[async_trait]
pub trait AddressLookup: Send + Sync {
    async fn lookup(&self, postal_code: &str) -> Result<Address, LookupError>;
}
