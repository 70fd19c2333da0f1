use crate::domain::entities::record::{Position, Record, StoredRecord};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("linha inválida: {0}")]
    InvalidPosition(Position),
    #[error("{0}")]
    Persistence(String),
}

impl StoreError {
    pub fn persistence(err: anyhow::Error) -> Self {
        StoreError::Persistence(format!("{err:#}"))
    }
}

/// Records kept as rows of a single sheet, addressed by their row position.
///
/// Every call goes back to the backing file; positions returned by [`list`] are
/// only meaningful until the next mutation.
///
/// [`list`]: RecordRepository::list
pub trait RecordRepository: Send + Sync {
    fn append(&self, record: &Record) -> Result<(), StoreError>;

    /// Non-blank records, most recently appended first.
    fn list(&self) -> Result<Vec<StoredRecord>, StoreError>;

    fn fetch(&self, position: Position) -> Result<Record, StoreError>;
    fn update(&self, position: Position, record: &Record) -> Result<(), StoreError>;
    fn delete(&self, position: Position) -> Result<(), StoreError>;
}
