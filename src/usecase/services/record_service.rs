use std::sync::Arc;

use crate::domain::entities::record::{Record, StoredRecord, TIMESTAMP_FORMAT};
use crate::usecase::ports::repo::{RecordRepository, StoreError};
use crate::usecase::services::form_machine::{FormMsg, PersistCommand, Selection};

pub fn local_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Runs the store side of the form's effects and reports back as messages.
pub struct RecordService {
    repo: Arc<dyn RecordRepository>,
    clock: fn() -> String,
}

impl RecordService {
    pub fn new(repo: Arc<dyn RecordRepository>) -> Self {
        Self::with_clock(repo, local_timestamp)
    }

    pub fn with_clock(repo: Arc<dyn RecordRepository>, clock: fn() -> String) -> Self {
        Self { repo, clock }
    }

    pub fn persist(&self, command: PersistCommand) -> FormMsg {
        let kind = command.kind();
        let result = match command {
            PersistCommand::Append(draft) => self.repo.append(&draft.stamp((self.clock)())),
            PersistCommand::Update { selection, draft } => self
                .ensure_current(&selection)
                .and_then(|_| {
                    self.repo
                        .update(selection.position, &draft.stamp((self.clock)()))
                }),
            PersistCommand::Delete { selection } => self
                .ensure_current(&selection)
                .and_then(|_| self.repo.delete(selection.position)),
        };

        if let Err(err) = &result {
            tracing::warn!(?kind, error = %err, "record mutation failed");
        }
        FormMsg::Persisted { kind, result }
    }

    pub fn refresh(&self, announce: bool) -> FormMsg {
        FormMsg::Listed {
            announce,
            result: self.list(),
        }
    }

    pub fn list(&self) -> Result<Vec<StoredRecord>, StoreError> {
        self.repo.list()
    }

    /// Re-reads the selected row and refuses to act on it if it no longer holds
    /// what was listed when the user picked it.
    fn ensure_current(&self, selection: &Selection) -> Result<(), StoreError> {
        let current: Record = self.repo.fetch(selection.position)?;
        if current != selection.snapshot {
            tracing::warn!(
                position = %selection.position,
                "selected row changed since it was listed"
            );
            return Err(StoreError::InvalidPosition(selection.position));
        }
        Ok(())
    }
}
