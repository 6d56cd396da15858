use serde::{Deserialize, Serialize};

use crate::editor::EditorState;
use crate::list::ProcedureList;
use crate::model::{Ambulance, Component, Entity, Model, Procedure, References, VisitType};
use crate::AMBULANCE_STATUSES;

// --- Editor ---

/// What an editor shows. Error wins over loading, loading over the form.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EditorView<F> {
    Error {
        message: String,
        /// The working copy survived and can be shown again.
        can_dismiss: bool,
    },
    Loading,
    Form {
        form: F,
        is_new: bool,
        can_save: bool,
        can_delete: bool,
        invalid_fields: Vec<String>,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AmbulanceForm {
    pub entry: Ambulance,
    pub statuses: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AmbulanceOption {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProcedureForm {
    pub entry: Procedure,
    /// Picker options; empty when the reference collection is unavailable.
    pub ambulances: Vec<AmbulanceOption>,
    pub ambulance_name: String,
}

fn editor_view<E: Entity, F>(
    editor: &EditorState<E>,
    form: impl FnOnce(&E, &References) -> F,
) -> EditorView<F> {
    if let Some(error) = editor.error() {
        return EditorView::Error {
            message: error.message.clone(),
            can_dismiss: editor.entry().is_some(),
        };
    }
    let Some(entry) = editor.entry().filter(|_| !editor.is_loading()) else {
        return EditorView::Loading;
    };
    EditorView::Form {
        form: form(entry, editor.references()),
        is_new: editor.is_new(),
        can_save: editor.can_save(),
        can_delete: editor.can_delete(),
        invalid_fields: entry
            .violations()
            .iter()
            .map(|v| v.field().to_string())
            .collect(),
    }
}

pub fn ambulance_editor(editor: &EditorState<Ambulance>) -> EditorView<AmbulanceForm> {
    editor_view(editor, |entry, _| AmbulanceForm {
        entry: entry.clone(),
        statuses: AMBULANCE_STATUSES.iter().map(|s| (*s).to_string()).collect(),
    })
}

pub fn procedure_editor(editor: &EditorState<Procedure>) -> EditorView<ProcedureForm> {
    editor_view(editor, |entry, references| ProcedureForm {
        entry: entry.clone(),
        ambulances: references
            .ambulances()
            .iter()
            .map(|a| AmbulanceOption {
                id: a.id.to_string(),
                name: a.name.clone(),
            })
            .collect(),
        ambulance_name: references.resolve(entry.ambulance_id.as_str()).to_string(),
    })
}

// --- List ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProcedureRow {
    pub id: String,
    pub description: String,
    pub patient: String,
    pub payer: String,
    pub price: f64,
    pub visit_type: VisitType,
    /// Resolved ambulance name; only present on unfiltered tables.
    pub ambulance: Option<String>,
    pub approving: bool,
    pub can_approve: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ListBody {
    Loading,
    Table {
        /// Name of the ambulance the list is filtered to.
        heading: Option<String>,
        show_ambulance_column: bool,
        rows: Vec<ProcedureRow>,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ListView {
    /// Banner shown alongside the body.
    pub error: Option<String>,
    pub body: ListBody,
}

pub fn procedure_list(list: &ProcedureList) -> ListView {
    let error = list.error().map(|e| e.message.clone());
    if list.is_loading() {
        return ListView {
            error,
            body: ListBody::Loading,
        };
    }

    let filtered = list.parent().is_some();
    let rows = list
        .items()
        .iter()
        .map(|item| {
            let approving = list.is_pending(&item.id);
            ProcedureRow {
                id: item.id.to_string(),
                description: item.description.clone(),
                patient: item.patient.clone(),
                payer: item.payer.clone(),
                price: item.price,
                visit_type: item.visit_type,
                ambulance: (!filtered)
                    .then(|| list.ambulance_name(item.ambulance_id.as_str()).to_string()),
                approving,
                can_approve: !approving,
            }
        })
        .collect();

    ListView {
        error,
        body: ListBody::Table {
            heading: list.parent_name().map(str::to_string),
            show_ambulance_column: !filtered,
            rows,
        },
    }
}

// --- Root ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ViewModel {
    Idle,
    AmbulanceEditor(EditorView<AmbulanceForm>),
    ProcedureEditor(EditorView<ProcedureForm>),
    ProcedureList(ListView),
}

impl ViewModel {
    pub fn from_model(model: &Model) -> Self {
        match &model.component {
            Component::Idle => Self::Idle,
            Component::AmbulanceEditor(editor) => Self::AmbulanceEditor(ambulance_editor(editor)),
            Component::ProcedureEditor(editor) => Self::ProcedureEditor(procedure_editor(editor)),
            Component::ProcedureList(list) => Self::ProcedureList(procedure_list(list)),
        }
    }
}
