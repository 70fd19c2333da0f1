use std::path::PathBuf;
use std::sync::Arc;

use dioxus::prelude::*;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

use crate::config::AppConfig;
use crate::domain::entities::form::Field;
use crate::domain::entities::record::Position;
use crate::infra::viacep::client::ViaCepClient;
use crate::ui::state::app_state::AppState;
use crate::usecase::ports::lookup::AddressLookup;
use crate::usecase::services::form_machine::{FormMsg, Mode, StatusKind};

const TABLE_HEADERS: [&str; 11] = [
    "Data/Hora",
    "Nome",
    "E-mail",
    "Telefone",
    "CEP",
    "Logradouro",
    "Bairro",
    "Cidade",
    "UF",
    "Número",
    "Complemento",
];

const BUTTON_STYLE: &str = "padding: 6px 14px; border-radius: 6px; cursor: pointer;";

fn build_lookup(config: &AppConfig) -> Result<Arc<dyn AddressLookup>, String> {
    ViaCepClient::new(config.lookup_url_template.clone(), config.lookup_timeout)
        .map(|client| Arc::new(client) as Arc<dyn AddressLookup>)
        .map_err(|err| format!("{err:#}"))
}

fn status_color(kind: StatusKind) -> &'static str {
    match kind {
        StatusKind::Info => "#2e7d32",
        StatusKind::Error => "#c62828",
    }
}

#[component]
fn FieldInput(
    field: Field,
    value: String,
    disabled: bool,
    on_input: EventHandler<String>,
) -> Element {
    let grow = if field == Field::Region { "0 0 90px" } else { "1 1 240px" };
    let caption = field.label();
    rsx! {
        label {
            style: "display: flex; flex-direction: column; gap: 4px; font-size: 13px; flex: {grow};",
            "{caption}"
            input {
                style: "padding: 6px; border: 1px solid #bbb; border-radius: 6px;",
                value: "{value}",
                disabled: disabled,
                maxlength: field.max_length().map(|max| max.to_string()),
                oninput: move |event| on_input.call(event.value()),
            }
        }
    }
}

#[component]
fn RecordsTable(
    rows: Vec<(Position, &'static str, Vec<String>)>,
    on_select: EventHandler<Position>,
) -> Element {
    rsx! {
        div {
            style: "border: 1px solid #ccc; border-radius: 10px; padding: 8px; overflow: auto; max-height: 360px;",
            if rows.is_empty() {
                p { "Nenhum cadastro ainda." }
            } else {
                table {
                    style: "border-collapse: collapse; width: 100%; font-size: 13px;",
                    thead {
                        tr {
                            for header in TABLE_HEADERS {
                                th {
                                    style: "text-align: left; padding: 6px; border-bottom: 1px solid #ccc; position: sticky; top: 0; background: #fafafa;",
                                    "{header}"
                                }
                            }
                        }
                    }
                    tbody {
                        for (position, background, cells) in rows {
                            tr {
                                key: "{position}",
                                style: "cursor: pointer; background: {background};",
                                onclick: move |_| on_select.call(position),
                                for cell in cells {
                                    td { style: "padding: 6px; border-bottom: 1px solid #eee;", "{cell}" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
pub fn App() -> Element {
    let config = use_context::<AppConfig>();
    let lookup = use_hook(|| build_lookup(&config));
    let lookup = match lookup {
        Ok(lookup) => lookup,
        Err(err) => {
            return rsx! {
                div {
                    p { "Não foi possível iniciar a consulta de CEP: {err}" }
                }
            };
        }
    };

    let state = AppState::new(&config, lookup);
    let form = state.form;
    let workbook_path = state.workbook_path;

    let state_for_dispatch = state.clone();
    let dispatch = use_callback(move |msg: FormMsg| state_for_dispatch.dispatch(msg));
    let state_for_open = state.clone();
    let open_workbook = use_callback(move |path: PathBuf| state_for_open.open_workbook(path));
    let state_for_load = state.clone();
    use_effect(move || state_for_load.load());

    let snapshot = form.read().clone();
    let selected = snapshot.selected_position();
    let editing = matches!(snapshot.mode, Mode::Editing(_));
    let confirming = snapshot.is_confirming_delete();
    let looking_up = snapshot.is_looking_up();
    let status = snapshot
        .status
        .as_ref()
        .map(|status| (status.text.clone(), status_color(status.kind)));
    let workbook_label = workbook_path().display().to_string();
    let rows: Vec<(Position, &'static str, Vec<String>)> = snapshot
        .records
        .iter()
        .map(|stored| {
            let background = if selected == Some(stored.position) {
                "#e3f2fd"
            } else {
                "transparent"
            };
            let cells = stored
                .record
                .to_row()
                .iter()
                .map(|cell| cell.to_string())
                .collect();
            (stored.position, background, cells)
        })
        .collect();
    let save_label = if editing { "Salvar alterações" } else { "Salvar novo" };

    rsx! {
        div {
            style: "font-family: sans-serif; padding: 20px; display: flex; flex-direction: column; gap: 10px;",
            h2 { style: "margin: 0;", "Cadastro de Usuários" }
            p { style: "margin: 0;", "Clique em uma linha da tabela para carregar nos campos e editar/excluir." }
            div {
                style: "display: flex; gap: 12px; align-items: center; font-size: 13px; color: #555;",
                span { "Planilha: {workbook_label}" }
                button {
                    style: BUTTON_STYLE,
                    r#type: "button",
                    disabled: confirming,
                    onclick: move |_| {
                        let Some(path) = FileDialog::new()
                            .add_filter("Planilha Excel", &["xlsx"])
                            .pick_file() else {
                            return;
                        };
                        open_workbook.call(path);
                    },
                    "Abrir planilha…"
                }
            }
            hr { style: "width: 100%;" }

            form {
                style: "display: flex; flex-direction: column; gap: 10px;",
                onsubmit: move |event: FormEvent| {
                    event.prevent_default();
                    dispatch.call(FormMsg::Save);
                },
                div {
                    style: "display: flex; flex-wrap: wrap; gap: 12px;",
                    for field in Field::ALL {
                        FieldInput {
                            field,
                            value: snapshot.fields.get(field).to_string(),
                            disabled: confirming,
                            on_input: move |value: String| dispatch.call(FormMsg::FieldChanged(field, value)),
                        }
                    }
                }
                if looking_up {
                    span { style: "font-size: 13px; color: #555;", "Consultando CEP…" }
                }
                div {
                    style: "display: flex; gap: 12px; flex-wrap: wrap;",
                    button { style: BUTTON_STYLE, r#type: "submit", disabled: confirming, "{save_label}" }
                    if editing {
                        button {
                            style: BUTTON_STYLE,
                            r#type: "button",
                            onclick: move |_| dispatch.call(FormMsg::SaveAsNew),
                            "Salvar como novo"
                        }
                    }
                    button {
                        style: BUTTON_STYLE,
                        r#type: "button",
                        disabled: selected.is_none() || confirming,
                        onclick: move |_| {
                            dispatch.call(FormMsg::RequestDelete);
                            if !form.peek().is_confirming_delete() {
                                return;
                            }
                            let confirmed = MessageDialog::new()
                                .set_level(MessageLevel::Warning)
                                .set_title("Confirmar exclusão")
                                .set_description("Tem certeza que deseja excluir o registro selecionado?")
                                .set_buttons(MessageButtons::YesNo)
                                .show();
                            if confirmed == MessageDialogResult::Yes {
                                dispatch.call(FormMsg::ConfirmDelete);
                            } else {
                                dispatch.call(FormMsg::CancelDelete);
                            }
                        },
                        "Excluir selecionado"
                    }
                    button {
                        style: BUTTON_STYLE,
                        r#type: "button",
                        disabled: confirming,
                        onclick: move |_| dispatch.call(FormMsg::Clear),
                        "Limpar"
                    }
                    button {
                        style: BUTTON_STYLE,
                        r#type: "button",
                        disabled: confirming,
                        onclick: move |_| dispatch.call(FormMsg::Refresh),
                        "Atualizar tabela"
                    }
                }
            }

            hr { style: "width: 100%;" }
            if let Some((text, color)) = status {
                p {
                    style: "margin: 0; color: {color};",
                    "{text}"
                }
            }
            hr { style: "width: 100%;" }

            h3 { style: "margin: 0;", "Cadastros salvos" }
            RecordsTable {
                rows,
                on_select: move |position: Position| dispatch.call(FormMsg::Select(position)),
            }
        }
    }
}
