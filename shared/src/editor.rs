use tracing::{debug, info, warn};

use crate::api::{accept, decode, ApiClient, ApiRequest, ServiceError};
use crate::capabilities::{EditorSignal, HttpResult};
use crate::event::EditorConfig;
use crate::model::{Ambulance, Entity, EntityId, References};
use crate::{AppError, ErrorKind};

/// Requests an editor issues while mounting. Both are sent in the same update
/// and may settle in any order.
#[derive(Debug, Default)]
pub struct OpenRequests {
    pub entry: Option<ApiRequest>,
    pub references: Option<ApiRequest>,
}

/// Load, edit, validate, persist or delete one entity.
///
/// Transitions are pure: methods that need the service return the request to
/// send and the caller routes the response back in.
#[derive(Debug)]
pub struct EditorState<E: Entity> {
    target: Option<EntityId>,
    client: Option<ApiClient>,
    entry: Option<E>,
    error: Option<AppError>,
    is_valid: bool,
    references: References,
    closed: Option<EditorSignal>,
}

impl<E: Entity> EditorState<E> {
    /// Mounts an editor. With `with_references` the ambulance collection is
    /// fetched next to the entry for name lookup.
    pub fn open(config: &EditorConfig, with_references: bool) -> (Self, OpenRequests) {
        let label = E::KIND.label();
        let mut requests = OpenRequests::default();
        let mut editor = Self {
            target: config
                .entity_id
                .as_deref()
                .filter(|id| !id.is_empty())
                .map(EntityId::new),
            client: None,
            entry: None,
            error: None,
            is_valid: false,
            references: References::NotUsed,
            closed: None,
        };

        let client = match ApiClient::new(&config.api_base) {
            Ok(client) => client,
            Err(e) => {
                warn!(entity = label, api_base = %config.api_base, error = %e, "invalid api base");
                editor.error = Some(
                    AppError::new(ErrorKind::Configuration, format!("Invalid API base: {e}"))
                        .with_context("api_base", config.api_base.clone()),
                );
                return (editor, requests);
            }
        };

        let Some(target) = editor.target.clone() else {
            editor.error = Some(AppError::new(
                ErrorKind::MissingInput,
                format!("No {label} ID provided"),
            ));
            editor.client = Some(client);
            return (editor, requests);
        };

        if target.is_new() {
            editor.entry = Some(E::placeholder());
        } else {
            match client.fetch::<E>(&target) {
                Ok(request) => requests.entry = Some(request),
                Err(e) => {
                    editor.error = Some(
                        AppError::new(ErrorKind::Fetch, format!("Error loading {label}: {e}"))
                            .with_context("id", target.to_string()),
                    );
                }
            }
        }

        if with_references {
            match client.fetch_all::<Ambulance>() {
                Ok(request) => {
                    editor.references = References::Pending;
                    requests.references = Some(request);
                }
                Err(e) => {
                    warn!(error = %e, "cannot build ambulance reference request");
                    editor.references = References::Unavailable;
                }
            }
        }

        info!(entity = label, id = %target, "editor opened");
        editor.client = Some(client);
        (editor, requests)
    }

    pub fn target(&self) -> Option<&EntityId> {
        self.target.as_ref()
    }

    pub fn entry(&self) -> Option<&E> {
        self.entry.as_ref()
    }

    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn references(&self) -> &References {
        &self.references
    }

    /// Terminal signal already emitted, if any. A closed editor ignores
    /// every further event.
    pub fn closed_with(&self) -> Option<EditorSignal> {
        self.closed
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_some()
    }

    /// No entry yet, or the ambulance collection has not settled.
    pub fn is_loading(&self) -> bool {
        self.entry.is_none() || self.references.is_pending()
    }

    pub fn is_new(&self) -> bool {
        self.target.as_ref().is_some_and(EntityId::is_new)
    }

    pub fn can_save(&self) -> bool {
        self.is_valid && self.entry.is_some()
    }

    pub fn can_delete(&self) -> bool {
        self.entry.is_some() && self.target.as_ref().is_some_and(|t| !t.is_new())
    }

    pub fn entry_loaded(&mut self, result: HttpResult) {
        let label = E::KIND.label();
        match decode::<E>(result) {
            Ok(entry) => {
                debug!(entity = label, id = %entry.id(), "entry loaded");
                self.entry = Some(entry);
                self.is_valid = true;
            }
            Err(e) => {
                warn!(entity = label, error = %e, "entry load failed");
                let kind = if e.is_not_found() {
                    ErrorKind::NotFound
                } else {
                    ErrorKind::Fetch
                };
                self.error = Some(
                    AppError::new(kind, format!("Error loading {label}: {e}"))
                        .with_internal(format!("{e:?}")),
                );
                self.is_valid = false;
            }
        }
    }

    pub fn references_loaded(&mut self, result: HttpResult) {
        self.references = match decode::<Vec<Ambulance>>(result) {
            Ok(ambulances) => {
                debug!(count = ambulances.len(), "ambulance references loaded");
                References::Loaded(ambulances)
            }
            Err(e) => {
                let error = AppError::new(ErrorKind::ReferenceLoad, e.to_string())
                    .with_internal(format!("{e:?}"));
                warn!(%error, "ambulance references unavailable, showing raw ids");
                References::Unavailable
            }
        };
    }

    pub fn apply_field(&mut self, field: E::Field) {
        let Some(entry) = self.entry.as_mut() else {
            debug!(?field, "field change ignored, no entry loaded");
            return;
        };
        entry.apply(field);
        self.is_valid = entry.is_valid();
    }

    /// Create request for a new entity, full update otherwise. `None` when the
    /// form is not savable.
    pub fn begin_save(&mut self) -> Option<ApiRequest> {
        if !self.can_save() {
            debug!("save ignored, form invalid");
            return None;
        }
        let (Some(entry), Some(target), Some(client)) =
            (self.entry.as_ref(), self.target.as_ref(), self.client.as_ref())
        else {
            return None;
        };

        self.error = None;
        let request = if target.is_new() {
            client.create(entry)
        } else {
            client.update(target, entry)
        };
        match request {
            Ok(request) => Some(request),
            Err(e) => {
                self.error = Some(AppError::new(ErrorKind::Persist, format!("Save error: {e}")));
                None
            }
        }
    }

    pub fn stored(&mut self, result: HttpResult) -> Option<EditorSignal> {
        match accept(result) {
            Ok(_) => self.close(EditorSignal::Stored),
            Err(e) => {
                self.fail(ErrorKind::Persist, "Save error", &e);
                None
            }
        }
    }

    pub fn begin_delete(&mut self) -> Option<ApiRequest> {
        if !self.can_delete() {
            debug!("delete ignored, nothing stored to delete");
            return None;
        }
        let (Some(target), Some(client)) = (self.target.as_ref(), self.client.as_ref()) else {
            return None;
        };

        self.error = None;
        match client.delete::<E>(target) {
            Ok(request) => Some(request),
            Err(e) => {
                self.error = Some(AppError::new(ErrorKind::Persist, format!("Delete error: {e}")));
                None
            }
        }
    }

    pub fn deleted(&mut self, result: HttpResult) -> Option<EditorSignal> {
        match accept(result) {
            Ok(_) => self.close(EditorSignal::Deleted),
            Err(e) => {
                self.fail(ErrorKind::Persist, "Delete error", &e);
                None
            }
        }
    }

    pub fn cancel(&mut self) -> Option<EditorSignal> {
        self.close(EditorSignal::Cancelled)
    }

    /// Hides the error so the retained working copy is shown again.
    pub fn dismiss_error(&mut self) {
        if self.entry.is_some() {
            self.error = None;
        }
    }

    fn close(&mut self, signal: EditorSignal) -> Option<EditorSignal> {
        info!(entity = E::KIND.label(), %signal, "editor closed");
        self.closed = Some(signal);
        Some(signal)
    }

    fn fail(&mut self, kind: ErrorKind, prefix: &str, cause: &ServiceError) {
        warn!(entity = E::KIND.label(), error = %cause, "{prefix}");
        let mut error = AppError::new(kind, format!("{prefix}: {cause}"));
        if let Some(status) = cause.status() {
            error = error.with_context("http_status", status.to_string());
        }
        self.error = Some(error);
    }
}
