use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::domain::entities::form::Field;
use crate::domain::entities::record::{Address, Position, Record, HEADERS};
use crate::infra::xlsx::repo::XlsxRecordRepo;
use crate::infra::xlsx::workbook::{read_rows, write_header, write_row};
use crate::usecase::ports::lookup::{AddressLookup, LookupError};
use crate::usecase::ports::repo::{RecordRepository, StoreError};
use crate::usecase::services::form_machine::{
    transition, Effect, FormMsg, FormState, Mode, Status, StatusKind,
};
use crate::usecase::services::record_service::RecordService;

const SHEET: &str = "usuarios";

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("cadastro-{prefix}-{nanos}"))
}

fn repo_in(dir: &Path) -> XlsxRecordRepo {
    XlsxRecordRepo::new(dir.join("cadastros.xlsx"), SHEET)
}

fn record(name: &str) -> Record {
    Record {
        timestamp: "2024-05-01 09:30:00".to_string(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        phone: "92 99999-0000".to_string(),
        postal_code: "69000000".to_string(),
        street: "Rua das Flores".to_string(),
        neighborhood: "Centro".to_string(),
        city: "Manaus".to_string(),
        region: "AM".to_string(),
        number: "10".to_string(),
        complement: "Apto 1".to_string(),
    }
}

fn names(repo: &XlsxRecordRepo) -> Vec<String> {
    repo.list()
        .expect("list should succeed")
        .into_iter()
        .map(|stored| stored.record.name)
        .collect()
}

#[test]
fn list_creates_missing_workbook_with_header() {
    let temp_dir = unique_test_dir("create");
    let repo = repo_in(&temp_dir);

    let listed = repo.list().expect("list should succeed");

    assert!(listed.is_empty());
    let rows = read_rows(&repo.workbook_path, SHEET).expect("workbook should be readable");
    assert_eq!(rows.len(), 1, "only the header row should exist");
    assert_eq!(rows[0], HEADERS.map(String::from).to_vec());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn append_then_list_round_trips_fields() {
    let temp_dir = unique_test_dir("append");
    let repo = repo_in(&temp_dir);
    let ana = record("Ana");

    repo.append(&ana).expect("append should succeed");
    let listed = repo.list().expect("list should succeed");

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].record, ana);
    assert_eq!(listed[0].position, Position(2));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn list_returns_most_recent_first() {
    let temp_dir = unique_test_dir("order");
    let repo = repo_in(&temp_dir);

    repo.append(&record("R1")).expect("append should succeed");
    repo.append(&record("R2")).expect("append should succeed");

    assert_eq!(names(&repo), vec!["R2", "R1"]);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn postal_code_keeps_leading_zero() {
    let temp_dir = unique_test_dir("leading-zero");
    let repo = repo_in(&temp_dir);
    let mut paulista = record("Bia");
    paulista.postal_code = "01001000".to_string();
    paulista.number = "007".to_string();

    repo.append(&paulista).expect("append should succeed");
    let fetched = repo.fetch(Position(2)).expect("fetch should succeed");

    assert_eq!(fetched.postal_code, "01001000");
    assert_eq!(fetched.number, "007");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn update_overwrites_row_in_place() {
    let temp_dir = unique_test_dir("update");
    let repo = repo_in(&temp_dir);
    repo.append(&record("Ana")).expect("append should succeed");
    repo.append(&record("Bia")).expect("append should succeed");

    let mut changed = record("Ana Maria");
    changed.timestamp = "2024-06-01 12:00:00".to_string();
    changed.complement = String::new();
    repo.update(Position(2), &changed).expect("update should succeed");

    assert_eq!(repo.fetch(Position(2)).expect("fetch should succeed"), changed);
    assert_eq!(names(&repo), vec!["Bia", "Ana Maria"]);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn update_and_delete_reject_out_of_range_positions() {
    let temp_dir = unique_test_dir("bounds");
    let repo = repo_in(&temp_dir);
    repo.append(&record("Ana")).expect("append should succeed");

    for position in [Position(1), Position(3), Position(0)] {
        assert_eq!(
            repo.update(position, &record("X")),
            Err(StoreError::InvalidPosition(position))
        );
        assert_eq!(
            repo.delete(position),
            Err(StoreError::InvalidPosition(position))
        );
    }
    assert_eq!(names(&repo), vec!["Ana"]);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn delete_removes_exactly_one_row_and_shifts_rows_up() {
    let temp_dir = unique_test_dir("delete");
    let repo = repo_in(&temp_dir);
    for name in ["R1", "R2", "R3"] {
        repo.append(&record(name)).expect("append should succeed");
    }

    repo.delete(Position(3)).expect("delete should succeed");

    let listed = repo.list().expect("list should succeed");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].record.name, "R3");
    assert_eq!(listed[0].position, Position(3));
    assert_eq!(listed[1].record.name, "R1");
    assert_eq!(listed[1].position, Position(2));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn stale_position_after_delete_is_rejected() {
    let temp_dir = unique_test_dir("stale");
    let repo = repo_in(&temp_dir);
    repo.append(&record("R1")).expect("append should succeed");
    repo.append(&record("R2")).expect("append should succeed");
    let old_position = repo.list().expect("list should succeed")[0].position;
    assert_eq!(old_position, Position(3));

    repo.delete(Position(2)).expect("delete should succeed");

    assert_eq!(
        repo.update(old_position, &record("R2 editado")),
        Err(StoreError::InvalidPosition(old_position))
    );

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn blank_rows_are_skipped_by_list() {
    let temp_dir = unique_test_dir("blank");
    let repo = repo_in(&temp_dir);
    for name in ["R1", "R2", "R3"] {
        repo.append(&record(name)).expect("append should succeed");
    }

    repo.update(Position(3), &Record::default())
        .expect("blanking a row should succeed");

    let listed = repo.list().expect("list should succeed");
    let positions: Vec<Position> = listed.iter().map(|stored| stored.position).collect();
    assert_eq!(positions, vec![Position(4), Position(2)]);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn corrupted_header_is_rewritten() {
    let temp_dir = unique_test_dir("header");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let path = temp_dir.join("cadastros.xlsx");
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .new_sheet(SHEET)
        .expect("sheet should be created");
    sheet.get_cell_mut((1, 1)).set_value_string("quando");
    sheet.get_cell_mut((2, 1)).set_value_string("quem");
    umya_spreadsheet::writer::xlsx::write(&book, &path).expect("fixture should be written");

    let repo = XlsxRecordRepo::new(&path, SHEET);
    repo.append(&record("Ana")).expect("append should succeed");

    let rows = read_rows(&path, SHEET).expect("workbook should be readable");
    assert_eq!(rows[0], HEADERS.map(String::from).to_vec());
    assert_eq!(names(&repo), vec!["Ana"]);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn date_cells_from_other_tools_read_back_as_timestamps() {
    let temp_dir = unique_test_dir("date-cell");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let path = temp_dir.join("cadastros.xlsx");
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .new_sheet(SHEET)
        .expect("sheet should be created");
    write_header(sheet);
    write_row(sheet, 2, &record("Ana").to_row());
    sheet
        .get_cell_mut((1, 2))
        .set_value_number(45413.396527777775);
    sheet
        .get_style_mut((1, 2))
        .get_number_format_mut()
        .set_format_code("yyyy-mm-dd hh:mm:ss");
    umya_spreadsheet::writer::xlsx::write(&book, &path).expect("fixture should be written");

    let repo = XlsxRecordRepo::new(&path, SHEET);
    let listed = repo.list().expect("list should succeed");

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].record.timestamp, "2024-05-01 09:31:00");
    assert_eq!(listed[0].record.name, "Ana");
    assert_eq!(
        repo.fetch(Position(2)).expect("fetch should succeed").timestamp,
        "2024-05-01 09:31:00"
    );

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn missing_sheet_is_added_to_existing_workbook() {
    let temp_dir = unique_test_dir("sheet");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let path = temp_dir.join("cadastros.xlsx");
    let mut book = umya_spreadsheet::new_file();
    book.new_sheet("outra")
        .expect("sheet should be created")
        .get_cell_mut((1, 1))
        .set_value_string("manter");
    umya_spreadsheet::writer::xlsx::write(&book, &path).expect("fixture should be written");

    let repo = XlsxRecordRepo::new(&path, SHEET);
    assert!(repo.list().expect("list should succeed").is_empty());

    let other = read_rows(&path, "outra").expect("other sheet should survive");
    assert_eq!(other[0][0], "manter");
    assert!(
        read_rows(&path, "Sheet1").is_err(),
        "empty default sheet should be removed"
    );

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn unreadable_workbook_is_a_persistence_error() {
    let temp_dir = unique_test_dir("corrupt");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let path = temp_dir.join("cadastros.xlsx");
    fs::write(&path, "not a zip archive").expect("should write garbage");

    let repo = XlsxRecordRepo::new(&path, SHEET);

    assert!(matches!(repo.list(), Err(StoreError::Persistence(_))));
    assert!(matches!(
        repo.append(&record("Ana")),
        Err(StoreError::Persistence(_))
    ));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

struct CountingLookup {
    calls: AtomicUsize,
    answer: Result<Address, LookupError>,
}

#[async_trait]
impl AddressLookup for CountingLookup {
    async fn lookup(&self, _postal_code: &str) -> Result<Address, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

fn fixed_clock() -> String {
    "2024-07-01 08:00:00".to_string()
}

/// Drives the form the way the desktop runner does, with lookups awaited inline.
struct Harness {
    state: FormState,
    service: RecordService,
    lookup: CountingLookup,
}

impl Harness {
    fn new(repo: XlsxRecordRepo, answer: Result<Address, LookupError>) -> Self {
        let mut harness = Harness {
            state: FormState::default(),
            service: RecordService::with_clock(Arc::new(repo), fixed_clock),
            lookup: CountingLookup {
                calls: AtomicUsize::new(0),
                answer,
            },
        };
        let listed = harness.service.refresh(false);
        harness.send(listed);
        harness
    }

    fn send(&mut self, msg: FormMsg) {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            let (next, effects) = transition(std::mem::take(&mut self.state), msg);
            self.state = next;
            for effect in effects {
                let follow_up = match effect {
                    Effect::Persist(command) => self.service.persist(command),
                    Effect::Refresh { announce } => self.service.refresh(announce),
                    Effect::Lookup {
                        ticket,
                        postal_code,
                    } => FormMsg::LookupFinished {
                        ticket,
                        result: futures::executor::block_on(self.lookup.lookup(&postal_code)),
                    },
                };
                queue.push_back(follow_up);
            }
        }
    }

    fn type_text(&mut self, field: Field, value: &str) {
        self.send(FormMsg::FieldChanged(field, value.to_string()));
    }

    fn fill_valid(&mut self, name: &str) {
        self.type_text(Field::Name, name);
        self.type_text(Field::Email, "a@b.com");
        self.type_text(Field::Number, "10");
        self.type_text(Field::PostalCode, "69000-000");
    }

    fn lookup_calls(&self) -> usize {
        self.lookup.calls.load(Ordering::SeqCst)
    }
}

fn manaus() -> Address {
    Address {
        street: "Rua das Flores".to_string(),
        neighborhood: "Centro".to_string(),
        city: "Manaus".to_string(),
        region: "am".to_string(),
    }
}

#[test]
fn form_saves_new_record_with_looked_up_address() {
    let temp_dir = unique_test_dir("form-new");
    let mut harness = Harness::new(repo_in(&temp_dir), Ok(manaus()));

    harness.fill_valid("Ana");
    assert_eq!(harness.lookup_calls(), 1);
    assert_eq!(harness.state.fields.city, "Manaus");

    harness.send(FormMsg::Save);

    assert_eq!(harness.state.mode, Mode::Idle);
    assert_eq!(harness.state.status, Some(Status::info("Novo cadastro salvo.")));
    assert_eq!(harness.state.records.len(), 1);
    let saved = &harness.state.records[0].record;
    assert_eq!(saved.timestamp, "2024-07-01 08:00:00");
    assert_eq!(saved.postal_code, "69000000");
    assert_eq!(saved.region, "AM");
    assert_eq!(saved.city, "Manaus");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn partial_postal_code_never_reaches_lookup() {
    let temp_dir = unique_test_dir("form-partial");
    let mut harness = Harness::new(repo_in(&temp_dir), Ok(manaus()));

    harness.type_text(Field::PostalCode, "6900");
    harness.type_text(Field::PostalCode, "690000001");

    assert_eq!(harness.lookup_calls(), 0);
    assert!(!harness.state.is_looking_up());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn failed_lookup_leaves_address_fields() {
    let temp_dir = unique_test_dir("form-lookup-fail");
    let mut harness = Harness::new(
        repo_in(&temp_dir),
        Err(LookupError::LookupFailed("timeout".to_string())),
    );
    harness.type_text(Field::Street, "Rua Digitada");

    harness.type_text(Field::PostalCode, "69000000");

    assert_eq!(harness.lookup_calls(), 1);
    assert!(!harness.state.is_looking_up());
    assert_eq!(harness.state.fields.street, "Rua Digitada");
    assert_eq!(
        harness.state.status,
        Some(Status::error("Falha ao consultar CEP: timeout"))
    );

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn form_edits_selected_record_and_refreshes_timestamp() {
    let temp_dir = unique_test_dir("form-edit");
    let repo = repo_in(&temp_dir);
    repo.append(&record("Ana")).expect("append should succeed");
    repo.append(&record("Bia")).expect("append should succeed");
    let mut harness = Harness::new(repo, Ok(manaus()));

    harness.send(FormMsg::Select(Position(2)));
    assert_eq!(harness.state.fields.name, "Ana");
    harness.type_text(Field::Name, "Ana Paula");
    harness.send(FormMsg::Save);

    assert_eq!(harness.state.mode, Mode::Idle);
    assert_eq!(harness.state.status, Some(Status::info("Alterações salvas.")));
    let names: Vec<&str> = harness
        .state
        .records
        .iter()
        .map(|stored| stored.record.name.as_str())
        .collect();
    assert_eq!(names, vec!["Bia", "Ana Paula"]);
    assert_eq!(harness.state.records[1].record.timestamp, fixed_clock());
    assert_eq!(harness.lookup_calls(), 0, "selecting must not trigger a lookup");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn form_deletes_after_confirmation_only() {
    let temp_dir = unique_test_dir("form-delete");
    let repo = repo_in(&temp_dir);
    repo.append(&record("Ana")).expect("append should succeed");
    repo.append(&record("Bia")).expect("append should succeed");
    let mut harness = Harness::new(repo, Ok(manaus()));

    harness.send(FormMsg::Select(Position(3)));
    harness.send(FormMsg::RequestDelete);
    harness.send(FormMsg::CancelDelete);
    assert_eq!(harness.state.records.len(), 2);
    assert_eq!(harness.state.selected_position(), Some(Position(3)));

    harness.send(FormMsg::RequestDelete);
    harness.send(FormMsg::ConfirmDelete);

    assert_eq!(harness.state.mode, Mode::Idle);
    assert_eq!(harness.state.status, Some(Status::info("Registro excluído.")));
    assert_eq!(harness.state.records.len(), 1);
    assert_eq!(harness.state.records[0].record.name, "Ana");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn externally_changed_row_is_not_overwritten() {
    let temp_dir = unique_test_dir("form-external");
    let repo = repo_in(&temp_dir);
    repo.append(&record("Ana")).expect("append should succeed");
    repo.append(&record("Bia")).expect("append should succeed");
    let external = repo_in(&temp_dir);
    let mut harness = Harness::new(repo, Ok(manaus()));

    harness.send(FormMsg::Select(Position(3)));
    external
        .delete(Position(2))
        .expect("external delete should succeed");
    external
        .append(&record("Caio"))
        .expect("external append should succeed");
    harness.type_text(Field::Name, "Bia Souza");
    harness.send(FormMsg::Save);

    assert_eq!(harness.state.mode, Mode::Idle);
    assert_eq!(
        harness.state.status.as_ref().map(|status| status.kind),
        Some(StatusKind::Error)
    );
    assert_eq!(harness.state.fields.name, "Bia Souza", "typed fields are kept");
    assert_eq!(names(&external), vec!["Caio", "Bia"]);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn invalid_form_never_touches_the_workbook() {
    let temp_dir = unique_test_dir("form-invalid");
    let repo = repo_in(&temp_dir);
    let mut harness = Harness::new(repo, Ok(manaus()));

    harness.type_text(Field::Name, "Ana");
    harness.type_text(Field::PostalCode, "123");
    harness.send(FormMsg::Save);

    assert_eq!(
        harness.state.status,
        Some(Status::error("E-mail é obrigatório."))
    );
    assert!(harness.state.records.is_empty());
    assert!(names(&repo_in(&temp_dir)).is_empty());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}
