use serde::{Deserialize, Serialize};

use crate::capabilities::HttpResult;
use crate::model::MountId;

// --- Field updates: one variant per editable field, raw user input ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum AmbulanceField {
    Name(String),
    Location(String),
    Department(String),
    Capacity(String),
    Status(String),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ProcedureField {
    Description(String),
    Patient(String),
    Price(String),
    Payer(String),
    AmbulanceId(String),
}

// --- Mount configuration supplied by the shell ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EditorConfig {
    pub api_base: String,
    /// Target id, `@new` for creation. Absent or empty is a configuration error.
    #[serde(default)]
    pub entity_id: Option<String>,
}

impl EditorConfig {
    pub fn new(api_base: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            entity_id: Some(entity_id.into()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ListConfig {
    pub api_base: String,
    /// Restricts the list to the procedures of one ambulance.
    #[serde(default)]
    pub ambulance_id: Option<String>,
}

impl ListConfig {
    pub fn unfiltered(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ambulance_id: None,
        }
    }

    pub fn for_ambulance(api_base: impl Into<String>, ambulance_id: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ambulance_id: Some(ambulance_id.into()),
        }
    }
}

// --- Event enum: response variants are core-internal and boxed ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    // Mounting
    AmbulanceEditorOpened(EditorConfig),
    ProcedureEditorOpened(EditorConfig),
    ProcedureListOpened(ListConfig),
    ComponentClosed,

    // Editor
    AmbulanceFieldChanged(AmbulanceField),
    ProcedureFieldChanged(ProcedureField),
    SaveRequested,
    DeleteRequested,
    CancelRequested,
    ErrorDismissed,

    // List
    RefreshRequested,
    ApproveRequested {
        procedure_id: String,
    },
    ProcedureSelected {
        id: String,
    },
    NewProcedureRequested,

    // Capability responses
    #[serde(skip)]
    EntryLoaded {
        mount: MountId,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    ReferencesLoaded {
        mount: MountId,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    ProceduresLoaded {
        mount: MountId,
        seq: u64,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    EntryStored {
        mount: MountId,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    EntryDeleted {
        mount: MountId,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    ApprovalDelayElapsed {
        mount: MountId,
        procedure_id: String,
    },
    #[serde(skip)]
    ApprovalCompleted {
        mount: MountId,
        procedure_id: String,
        result: Box<HttpResult>,
    },
}

impl Event {
    /// Stable name for log fields.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AmbulanceEditorOpened(_) => "ambulance_editor_opened",
            Self::ProcedureEditorOpened(_) => "procedure_editor_opened",
            Self::ProcedureListOpened(_) => "procedure_list_opened",
            Self::ComponentClosed => "component_closed",
            Self::AmbulanceFieldChanged(_) => "ambulance_field_changed",
            Self::ProcedureFieldChanged(_) => "procedure_field_changed",
            Self::SaveRequested => "save_requested",
            Self::DeleteRequested => "delete_requested",
            Self::CancelRequested => "cancel_requested",
            Self::ErrorDismissed => "error_dismissed",
            Self::RefreshRequested => "refresh_requested",
            Self::ApproveRequested { .. } => "approve_requested",
            Self::ProcedureSelected { .. } => "procedure_selected",
            Self::NewProcedureRequested => "new_procedure_requested",
            Self::EntryLoaded { .. } => "entry_loaded",
            Self::ReferencesLoaded { .. } => "references_loaded",
            Self::ProceduresLoaded { .. } => "procedures_loaded",
            Self::EntryStored { .. } => "entry_stored",
            Self::EntryDeleted { .. } => "entry_deleted",
            Self::ApprovalDelayElapsed { .. } => "approval_delay_elapsed",
            Self::ApprovalCompleted { .. } => "approval_completed",
        }
    }

    /// Mounting and closing events; everything else targets the mounted
    /// component.
    pub const fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::AmbulanceEditorOpened(_)
                | Self::ProcedureEditorOpened(_)
                | Self::ProcedureListOpened(_)
                | Self::ComponentClosed
        )
    }

    /// Mount a capability response was issued for; `None` for shell events.
    pub const fn mount(&self) -> Option<MountId> {
        match self {
            Self::EntryLoaded { mount, .. }
            | Self::ReferencesLoaded { mount, .. }
            | Self::ProceduresLoaded { mount, .. }
            | Self::EntryStored { mount, .. }
            | Self::EntryDeleted { mount, .. }
            | Self::ApprovalDelayElapsed { mount, .. }
            | Self::ApprovalCompleted { mount, .. } => Some(*mount),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_updates_use_tagged_wire_format() {
        let json = serde_json::to_value(AmbulanceField::Capacity("3".into())).unwrap();
        assert_eq!(json, serde_json::json!({"field": "capacity", "value": "3"}));

        let field: ProcedureField =
            serde_json::from_value(serde_json::json!({"field": "ambulance_id", "value": "A1"}))
                .unwrap();
        assert_eq!(field, ProcedureField::AmbulanceId("A1".into()));
    }

    #[test]
    fn editor_config_tolerates_missing_id() {
        let config: EditorConfig =
            serde_json::from_value(serde_json::json!({"api_base": "http://localhost:8080/api"}))
                .unwrap();
        assert_eq!(config.entity_id, None);
    }

    #[test]
    fn shell_events_carry_no_mount() {
        assert_eq!(Event::SaveRequested.mount(), None);
        let event = Event::ApprovalDelayElapsed {
            mount: MountId(4),
            procedure_id: "P1".into(),
        };
        assert_eq!(event.mount(), Some(MountId(4)));
    }

    #[test]
    fn event_size_is_reasonable() {
        let size = std::mem::size_of::<Event>();
        assert!(
            size <= 128,
            "Event enum is {} bytes, box more variants",
            size
        );
    }
}
