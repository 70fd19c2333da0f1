use crate::domain::entities::form::{Field, FormFields, RecordDraft, POSTAL_CODE_DIGITS};
use crate::domain::entities::record::{only_digits, Address, Position, Record, StoredRecord};
use crate::usecase::ports::lookup::LookupError;
use crate::usecase::ports::repo::StoreError;

const CONFIRM_OR_CANCEL: &str = "Confirme ou cancele a exclusão.";
const STALE_SELECTION: &str =
    "Falha na operação: o registro selecionado não está mais nessa linha. Selecione-o novamente.";

/// A listed record loaded into the form, together with the row contents seen at selection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub position: Position,
    pub snapshot: Record,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Idle,
    Editing(Selection),
    ConfirmingDelete(Selection),
}

impl Mode {
    pub fn selection(&self) -> Option<&Selection> {
        match self {
            Mode::Idle => None,
            Mode::Editing(selection) | Mode::ConfirmingDelete(selection) => Some(selection),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub kind: StatusKind,
}

impl Status {
    pub fn info(text: impl Into<String>) -> Self {
        Status {
            text: text.into(),
            kind: StatusKind::Info,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Status {
            text: text.into(),
            kind: StatusKind::Error,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub fields: FormFields,
    pub mode: Mode,
    pub records: Vec<StoredRecord>,
    pub status: Option<Status>,
    /// Ticket of the lookup whose answer may still fill the address.
    pub lookup_in_flight: Option<u64>,
    pub last_lookup_ticket: u64,
}

impl FormState {
    pub fn selected_position(&self) -> Option<Position> {
        self.mode.selection().map(|selection| selection.position)
    }

    pub fn is_looking_up(&self) -> bool {
        self.lookup_in_flight.is_some()
    }

    pub fn is_confirming_delete(&self) -> bool {
        matches!(self.mode, Mode::ConfirmingDelete(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistKind {
    Append,
    Update,
    Delete,
}

impl PersistKind {
    fn success_message(self) -> &'static str {
        match self {
            PersistKind::Append => "Novo cadastro salvo.",
            PersistKind::Update => "Alterações salvas.",
            PersistKind::Delete => "Registro excluído.",
        }
    }

    fn failure_prefix(self) -> &'static str {
        match self {
            PersistKind::Append => "Erro ao salvar",
            PersistKind::Update => "Erro ao atualizar",
            PersistKind::Delete => "Erro ao excluir",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistCommand {
    Append(RecordDraft),
    Update {
        selection: Selection,
        draft: RecordDraft,
    },
    Delete {
        selection: Selection,
    },
}

impl PersistCommand {
    pub fn kind(&self) -> PersistKind {
        match self {
            PersistCommand::Append(_) => PersistKind::Append,
            PersistCommand::Update { .. } => PersistKind::Update,
            PersistCommand::Delete { .. } => PersistKind::Delete,
        }
    }
}

/// Work the runner has to carry out after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Persist(PersistCommand),
    Refresh { announce: bool },
    Lookup { ticket: u64, postal_code: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMsg {
    FieldChanged(Field, String),
    Select(Position),
    Save,
    SaveAsNew,
    RequestDelete,
    ConfirmDelete,
    CancelDelete,
    Clear,
    Refresh,
    LookupFinished {
        ticket: u64,
        result: Result<Address, LookupError>,
    },
    Persisted {
        kind: PersistKind,
        result: Result<(), StoreError>,
    },
    Listed {
        announce: bool,
        result: Result<Vec<StoredRecord>, StoreError>,
    },
}

impl FormMsg {
    /// Messages that come straight from the user, as opposed to effect completions.
    fn is_user_action(&self) -> bool {
        !matches!(
            self,
            FormMsg::ConfirmDelete
                | FormMsg::CancelDelete
                | FormMsg::LookupFinished { .. }
                | FormMsg::Persisted { .. }
                | FormMsg::Listed { .. }
        )
    }
}

pub fn transition(mut state: FormState, msg: FormMsg) -> (FormState, Vec<Effect>) {
    let mut effects = Vec::new();

    if state.is_confirming_delete() && msg.is_user_action() {
        state.status = Some(Status::error(CONFIRM_OR_CANCEL));
        return (state, effects);
    }

    match msg {
        FormMsg::FieldChanged(field, value) => field_changed(&mut state, &mut effects, field, value),
        FormMsg::Select(position) => select(&mut state, position),
        FormMsg::Save => save(&mut state, &mut effects, false),
        FormMsg::SaveAsNew => save(&mut state, &mut effects, true),
        FormMsg::RequestDelete => request_delete(&mut state),
        FormMsg::ConfirmDelete => {
            if let Mode::ConfirmingDelete(selection) = std::mem::take(&mut state.mode) {
                effects.push(Effect::Persist(PersistCommand::Delete {
                    selection: selection.clone(),
                }));
                state.mode = Mode::Editing(selection);
            }
        }
        FormMsg::CancelDelete => {
            if let Mode::ConfirmingDelete(selection) = std::mem::take(&mut state.mode) {
                state.mode = Mode::Editing(selection);
            }
        }
        FormMsg::Clear => {
            reset_form(&mut state);
            state.status = None;
        }
        FormMsg::Refresh => effects.push(Effect::Refresh { announce: true }),
        FormMsg::LookupFinished { ticket, result } => lookup_finished(&mut state, ticket, result),
        FormMsg::Persisted { kind, result } => persisted(&mut state, &mut effects, kind, result),
        FormMsg::Listed { announce, result } => listed(&mut state, announce, result),
    }

    (state, effects)
}

fn reset_form(state: &mut FormState) {
    state.fields = FormFields::default();
    state.mode = Mode::Idle;
    state.lookup_in_flight = None;
}

fn field_changed(state: &mut FormState, effects: &mut Vec<Effect>, field: Field, value: String) {
    state.fields.set(field, value);
    if field != Field::PostalCode {
        return;
    }

    state.status = None;
    let postal_code = only_digits(&state.fields.postal_code);
    if postal_code.len() == POSTAL_CODE_DIGITS {
        state.last_lookup_ticket += 1;
        let ticket = state.last_lookup_ticket;
        state.lookup_in_flight = Some(ticket);
        effects.push(Effect::Lookup {
            ticket,
            postal_code,
        });
    } else {
        state.lookup_in_flight = None;
    }
}

fn select(state: &mut FormState, position: Position) {
    let Some(stored) = state
        .records
        .iter()
        .find(|stored| stored.position == position)
    else {
        state.mode = Mode::Idle;
        state.status = Some(Status::error(format!(
            "Registro da linha {position} não encontrado. Atualize a tabela."
        )));
        return;
    };

    state.fields = FormFields::from_record(&stored.record);
    state.mode = Mode::Editing(Selection {
        position,
        snapshot: stored.record.clone(),
    });
    state.lookup_in_flight = None;
    state.status = Some(Status::info("Registro carregado para edição."));
}

fn save(state: &mut FormState, effects: &mut Vec<Effect>, as_new: bool) {
    let draft = match state.fields.validate() {
        Ok(draft) => draft,
        Err(err) => {
            state.status = Some(Status::error(err.to_string()));
            return;
        }
    };

    let command = match &state.mode {
        Mode::Editing(selection) if !as_new => PersistCommand::Update {
            selection: selection.clone(),
            draft,
        },
        _ => PersistCommand::Append(draft),
    };
    effects.push(Effect::Persist(command));
}

fn request_delete(state: &mut FormState) {
    match &state.mode {
        Mode::Editing(selection) => state.mode = Mode::ConfirmingDelete(selection.clone()),
        _ => {
            state.status = Some(Status::error(
                "Selecione um registro na tabela para excluir.",
            ));
        }
    }
}

fn lookup_finished(state: &mut FormState, ticket: u64, result: Result<Address, LookupError>) {
    if state.lookup_in_flight != Some(ticket) {
        return;
    }
    state.lookup_in_flight = None;

    match result {
        Ok(address) => {
            state.fields.fill_address(&address);
            state.status = Some(Status::info("Endereço preenchido via ViaCEP."));
        }
        Err(err) => {
            state.status = Some(Status::error(format!("Falha ao consultar CEP: {err}")));
        }
    }
}

fn persisted(
    state: &mut FormState,
    effects: &mut Vec<Effect>,
    kind: PersistKind,
    result: Result<(), StoreError>,
) {
    match result {
        Ok(()) => {
            reset_form(state);
            state.status = Some(Status::info(kind.success_message()));
            effects.push(Effect::Refresh { announce: false });
        }
        Err(StoreError::InvalidPosition(_)) => {
            state.mode = Mode::Idle;
            state.status = Some(Status::error(STALE_SELECTION));
            effects.push(Effect::Refresh { announce: false });
        }
        Err(StoreError::Persistence(detail)) => {
            if let Mode::ConfirmingDelete(selection) = &state.mode {
                state.mode = Mode::Editing(selection.clone());
            }
            state.status = Some(Status::error(format!(
                "{}: {detail}",
                kind.failure_prefix()
            )));
        }
    }
}

fn listed(state: &mut FormState, announce: bool, result: Result<Vec<StoredRecord>, StoreError>) {
    let records = match result {
        Ok(records) => records,
        Err(err) => {
            state.status = Some(Status::error(format!("Erro ao carregar cadastros: {err}")));
            return;
        }
    };
    state.records = records;

    if let Some(selection) = state.mode.selection() {
        let still_there = state.records.iter().any(|stored| {
            stored.position == selection.position && stored.record == selection.snapshot
        });
        if !still_there {
            state.mode = Mode::Idle;
            state.status = Some(Status::error(
                "O registro selecionado mudou na planilha. Selecione-o novamente.",
            ));
            return;
        }
    }

    if announce {
        state.status = Some(Status::info("Tabela atualizada."));
    }
}
