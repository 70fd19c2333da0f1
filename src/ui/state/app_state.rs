use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use dioxus::prelude::*;

use crate::config::AppConfig;
use crate::infra::xlsx::repo::XlsxRecordRepo;
use crate::platform::desktop::blocking::run_blocking;
use crate::usecase::ports::lookup::AddressLookup;
use crate::usecase::services::form_machine::{transition, Effect, FormMsg, FormState};
use crate::usecase::services::record_service::RecordService;

fn record_service(workbook_path: PathBuf, sheet_name: String) -> Arc<RecordService> {
    Arc::new(RecordService::new(Arc::new(XlsxRecordRepo::new(
        workbook_path,
        sheet_name,
    ))))
}

/// Owns the form state and carries out the effects each transition asks for.
#[derive(Clone)]
pub struct AppState {
    pub form: Signal<FormState>,
    pub workbook_path: Signal<PathBuf>,
    sheet_name: String,
    records: Signal<Arc<RecordService>>,
    lookup: Arc<dyn AddressLookup>,
}

impl AppState {
    pub fn new(config: &AppConfig, lookup: Arc<dyn AddressLookup>) -> Self {
        let workbook_path = config.workbook_path.clone();
        let sheet_name = config.sheet_name.clone();
        Self {
            form: use_signal(FormState::default),
            workbook_path: use_signal(|| workbook_path.clone()),
            records: use_signal(|| record_service(workbook_path, sheet_name)),
            sheet_name: config.sheet_name.clone(),
            lookup,
        }
    }

    pub fn dispatch(&self, msg: FormMsg) {
        self.process(VecDeque::from([msg]));
    }

    /// Loads the records without announcing it in the status line.
    pub fn load(&self) {
        let service = Arc::clone(&self.records.peek());
        let msg = run_blocking("list", || service.refresh(false));
        self.dispatch(msg);
    }

    pub fn open_workbook(&self, path: PathBuf) {
        tracing::info!(path = %path.display(), "switching workbook");
        let mut records = self.records;
        let mut workbook_path = self.workbook_path;
        records.set(record_service(path.clone(), self.sheet_name.clone()));
        workbook_path.set(path);
        self.dispatch(FormMsg::Clear);
        self.load();
    }

    /// Handles `queue` to completion; completions of store effects are handled
    /// before anything else is dispatched.
    fn process(&self, mut queue: VecDeque<FormMsg>) {
        let mut form = self.form;
        while let Some(msg) = queue.pop_front() {
            let current = std::mem::take(&mut *form.write());
            let (next, effects) = transition(current, msg);
            form.set(next);

            for effect in effects {
                match effect {
                    Effect::Persist(command) => {
                        let service = Arc::clone(&self.records.peek());
                        queue.push_back(run_blocking("persist", || service.persist(command)));
                    }
                    Effect::Refresh { announce } => {
                        let service = Arc::clone(&self.records.peek());
                        queue.push_back(run_blocking("list", || service.refresh(announce)));
                    }
                    Effect::Lookup {
                        ticket,
                        postal_code,
                    } => self.spawn_lookup(ticket, postal_code),
                }
            }
        }
    }

    fn spawn_lookup(&self, ticket: u64, postal_code: String) {
        let state = self.clone();
        spawn(async move {
            let result = state.lookup.lookup(&postal_code).await;
            state.dispatch(FormMsg::LookupFinished { ticket, result });
        });
    }
}
