#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod api;
pub mod capabilities;
pub mod editor;
pub mod event;
pub mod list;
pub mod model;
pub mod validation;
pub mod view;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use crux_core::App as CruxApp;
pub use event::Event;
pub use model::Model;
pub use view::ViewModel;

/// Reserved entity id meaning "not yet created".
pub const NEW_ENTITY_ID: &str = "@new";
/// Artificial pause before an approval call is sent.
pub const APPROVAL_DELAY: Duration = Duration::from_millis(1500);
/// Allowed ambulance status labels. The first one is the default.
pub const AMBULANCE_STATUSES: &[&str] = &["Dostupná", "Occupied", "Maintenance"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Required mount input (target id) is absent.
    MissingInput,
    NotFound,
    Fetch,
    Persist,
    /// Secondary reference data failed; logged, never shown.
    ReferenceLoad,
    Transition,
    Configuration,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MissingInput => "MISSING_INPUT",
            Self::NotFound => "NOT_FOUND",
            Self::Fetch => "FETCH_ERROR",
            Self::Persist => "PERSIST_ERROR",
            Self::ReferenceLoad => "REFERENCE_LOAD_ERROR",
            Self::Transition => "TRANSITION_ERROR",
            Self::Configuration => "CONFIGURATION_ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    /// Text shown to the user.
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

pub mod app {
    use tracing::debug;

    use crate::api::ApiRequest;
    use crate::capabilities::{Capabilities, EditorSignal};
    use crate::editor::EditorState;
    use crate::event::{EditorConfig, Event};
    use crate::list::{ItemFetch, ProcedureList};
    use crate::model::{Ambulance, Component, Entity, EntityId, Model, MountId, Procedure};
    use crate::view::ViewModel;
    use crate::{APPROVAL_DELAY, NEW_ENTITY_ID};

    /// Runs `$body` against whichever editor is mounted, yielding `None` when
    /// no editor is.
    macro_rules! with_editor {
        ($component:expr, $editor:ident => $body:expr) => {
            match $component {
                Component::AmbulanceEditor($editor) => Some($body),
                Component::ProcedureEditor($editor) => Some($body),
                _ => None,
            }
        };
    }

    #[derive(Default)]
    pub struct App;

    impl App {
        fn open_editor<E: Entity>(
            config: &EditorConfig,
            with_references: bool,
            mount: MountId,
            caps: &Capabilities,
        ) -> EditorState<E> {
            let (editor, requests) = EditorState::<E>::open(config, with_references);
            if let Some(request) = requests.entry {
                request.send(&caps.http, move |result| Event::EntryLoaded {
                    mount,
                    result: Box::new(result),
                });
            }
            if let Some(request) = requests.references {
                Self::fetch_references(request, mount, caps);
            }
            editor
        }

        fn fetch_references(request: ApiRequest, mount: MountId, caps: &Capabilities) {
            request.send(&caps.http, move |result| Event::ReferencesLoaded {
                mount,
                result: Box::new(result),
            });
        }

        fn fetch_items(fetch: ItemFetch, mount: MountId, caps: &Capabilities) {
            let seq = fetch.seq;
            fetch.request.send(&caps.http, move |result| Event::ProceduresLoaded {
                mount,
                seq,
                result: Box::new(result),
            });
        }

        fn emit(signal: Option<EditorSignal>, caps: &Capabilities) {
            if let Some(signal) = signal {
                caps.signal.editor_closed(signal);
            }
        }

        fn editor_closed(component: &Component) -> bool {
            with_editor!(component, editor => editor.is_closed()).unwrap_or(false)
        }

        fn ignored(event: &'static str, component: &Component) {
            debug!(event, component = component.name(), "event ignored by mounted component");
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        #[allow(clippy::too_many_lines)]
        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            let name = event.name();

            if let Some(mount) = event.mount() {
                if !model.is_current(mount) {
                    debug!(event = name, %mount, current = %model.mount, "stale response dropped");
                    return;
                }
            }
            if !event.is_lifecycle() && Self::editor_closed(&model.component) {
                Self::ignored(name, &model.component);
                return;
            }

            debug!(event = name, component = model.component.name(), "update");
            let mount = model.mount;

            match event {
                Event::AmbulanceEditorOpened(config) => {
                    let mount = model.remount();
                    let editor = Self::open_editor::<Ambulance>(&config, false, mount, caps);
                    model.component = Component::AmbulanceEditor(editor);
                }

                Event::ProcedureEditorOpened(config) => {
                    let mount = model.remount();
                    let editor = Self::open_editor::<Procedure>(&config, true, mount, caps);
                    model.component = Component::ProcedureEditor(editor);
                }

                Event::ProcedureListOpened(config) => {
                    let mount = model.remount();
                    let (list, requests) = ProcedureList::open(&config);
                    if let Some(request) = requests.references {
                        Self::fetch_references(request, mount, caps);
                    }
                    if let Some(fetch) = requests.items {
                        Self::fetch_items(fetch, mount, caps);
                    }
                    model.component = Component::ProcedureList(list);
                }

                Event::ComponentClosed => {
                    model.remount();
                    model.component = Component::Idle;
                }

                Event::AmbulanceFieldChanged(field) => match &mut model.component {
                    Component::AmbulanceEditor(editor) => editor.apply_field(field),
                    other => Self::ignored(name, other),
                },

                Event::ProcedureFieldChanged(field) => match &mut model.component {
                    Component::ProcedureEditor(editor) => editor.apply_field(field),
                    other => Self::ignored(name, other),
                },

                Event::SaveRequested => {
                    match with_editor!(&mut model.component, editor => editor.begin_save()) {
                        Some(Some(request)) => {
                            request.send(&caps.http, move |result| Event::EntryStored {
                                mount,
                                result: Box::new(result),
                            });
                        }
                        Some(None) => {}
                        None => Self::ignored(name, &model.component),
                    }
                }

                Event::DeleteRequested => {
                    match with_editor!(&mut model.component, editor => editor.begin_delete()) {
                        Some(Some(request)) => {
                            request.send(&caps.http, move |result| Event::EntryDeleted {
                                mount,
                                result: Box::new(result),
                            });
                        }
                        Some(None) => {}
                        None => Self::ignored(name, &model.component),
                    }
                }

                Event::CancelRequested => {
                    let signal = with_editor!(&mut model.component, editor => editor.cancel());
                    match signal {
                        Some(signal) => Self::emit(signal, caps),
                        None => Self::ignored(name, &model.component),
                    }
                }

                Event::ErrorDismissed => match &mut model.component {
                    Component::AmbulanceEditor(editor) => editor.dismiss_error(),
                    Component::ProcedureEditor(editor) => editor.dismiss_error(),
                    Component::ProcedureList(list) => list.dismiss_error(),
                    other @ Component::Idle => Self::ignored(name, other),
                },

                Event::RefreshRequested => match &mut model.component {
                    Component::ProcedureList(list) => {
                        if let Some(fetch) = list.refresh() {
                            Self::fetch_items(fetch, mount, caps);
                        }
                    }
                    other => Self::ignored(name, other),
                },

                Event::ApproveRequested { procedure_id } => match &mut model.component {
                    Component::ProcedureList(list) => {
                        if list.begin_approval(&EntityId::new(procedure_id.clone())) {
                            caps.timer.delay(APPROVAL_DELAY, move |_| {
                                Event::ApprovalDelayElapsed {
                                    mount,
                                    procedure_id,
                                }
                            });
                        }
                    }
                    other => Self::ignored(name, other),
                },

                Event::ProcedureSelected { id } => match &model.component {
                    Component::ProcedureList(_) => caps.signal.item_selected(id),
                    other => Self::ignored(name, other),
                },

                Event::NewProcedureRequested => match &model.component {
                    Component::ProcedureList(_) => caps.signal.item_selected(NEW_ENTITY_ID),
                    other => Self::ignored(name, other),
                },

                Event::EntryLoaded { result, .. } => {
                    with_editor!(&mut model.component, editor => editor.entry_loaded(*result));
                }

                Event::ReferencesLoaded { result, .. } => match &mut model.component {
                    Component::AmbulanceEditor(editor) => editor.references_loaded(*result),
                    Component::ProcedureEditor(editor) => editor.references_loaded(*result),
                    Component::ProcedureList(list) => list.references_loaded(*result),
                    Component::Idle => {}
                },

                Event::ProceduresLoaded { seq, result, .. } => {
                    if let Component::ProcedureList(list) = &mut model.component {
                        list.items_loaded(seq, *result);
                    }
                }

                Event::EntryStored { result, .. } => {
                    let signal = with_editor!(&mut model.component, editor => editor.stored(*result));
                    Self::emit(signal.flatten(), caps);
                }

                Event::EntryDeleted { result, .. } => {
                    let signal = with_editor!(&mut model.component, editor => editor.deleted(*result));
                    Self::emit(signal.flatten(), caps);
                }

                Event::ApprovalDelayElapsed { procedure_id, .. } => {
                    if let Component::ProcedureList(list) = &mut model.component {
                        let id = EntityId::new(procedure_id.clone());
                        if let Some(request) = list.approval_request(&id) {
                            request.send(&caps.http, move |result| Event::ApprovalCompleted {
                                mount,
                                procedure_id,
                                result: Box::new(result),
                            });
                        }
                    }
                }

                Event::ApprovalCompleted {
                    procedure_id,
                    result,
                    ..
                } => {
                    if let Component::ProcedureList(list) = &mut model.component {
                        list.finish_approval(&EntityId::new(procedure_id), *result);
                    }
                }
            }

            caps.render.render();
        }

        fn view(&self, model: &Model) -> ViewModel {
            ViewModel::from_model(model)
        }
    }
}
