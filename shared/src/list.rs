use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::api::{accept, decode, ApiClient, ApiRequest, ServiceError};
use crate::capabilities::HttpResult;
use crate::event::ListConfig;
use crate::model::{Ambulance, Entity, EntityId, Procedure, References, VisitType};
use crate::{AppError, ErrorKind};

const APPROVAL_FAILED: &str = "Approval failed";

/// Item fetch tagged with the sequence number its response must carry.
#[derive(Debug)]
pub struct ItemFetch {
    pub seq: u64,
    pub request: ApiRequest,
}

#[derive(Debug, Default)]
pub struct ListRequests {
    pub items: Option<ItemFetch>,
    pub references: Option<ApiRequest>,
}

/// Procedures, optionally scoped to one ambulance, with ambulance names
/// resolved from a reference collection and per-row approval.
#[derive(Debug)]
pub struct ProcedureList {
    parent: Option<EntityId>,
    client: Option<ApiClient>,
    items: Vec<Procedure>,
    references: References,
    items_loading: bool,
    fetch_seq: u64,
    error: Option<AppError>,
    pending: BTreeSet<EntityId>,
}

impl ProcedureList {
    pub fn open(config: &ListConfig) -> (Self, ListRequests) {
        let mut requests = ListRequests::default();
        let mut list = Self {
            parent: config
                .ambulance_id
                .as_deref()
                .filter(|id| !id.is_empty())
                .map(EntityId::new),
            client: None,
            items: Vec::new(),
            references: References::Pending,
            items_loading: false,
            fetch_seq: 0,
            error: None,
            pending: BTreeSet::new(),
        };

        match ApiClient::new(&config.api_base) {
            Ok(client) => list.client = Some(client),
            Err(e) => {
                warn!(api_base = %config.api_base, error = %e, "invalid api base");
                list.references = References::Unavailable;
                list.error = Some(
                    AppError::new(ErrorKind::Configuration, format!("Invalid API base: {e}"))
                        .with_context("api_base", config.api_base.clone()),
                );
                return (list, requests);
            }
        }

        requests.references = list.reference_request();
        requests.items = list.refresh();
        info!(parent = ?list.parent.as_ref().map(EntityId::as_str), "procedure list opened");
        (list, requests)
    }

    fn reference_request(&mut self) -> Option<ApiRequest> {
        let client = self.client.as_ref()?;
        match client.fetch_all::<Ambulance>() {
            Ok(request) => Some(request),
            Err(e) => {
                warn!(error = %e, "cannot build ambulance reference request");
                self.references = References::Unavailable;
                None
            }
        }
    }

    /// Starts a new item fetch. Responses of earlier fetches are ignored from
    /// here on and pending approvals are no longer tracked.
    pub fn refresh(&mut self) -> Option<ItemFetch> {
        let client = self.client.as_ref()?;
        let request = match &self.parent {
            Some(parent) => client.fetch_procedures_of(parent),
            None => client.fetch_all::<Procedure>(),
        };

        self.pending.clear();
        self.fetch_seq += 1;
        match request {
            Ok(request) => {
                self.items_loading = true;
                Some(ItemFetch {
                    seq: self.fetch_seq,
                    request,
                })
            }
            Err(e) => {
                self.items_loading = false;
                self.error = Some(AppError::new(
                    ErrorKind::Fetch,
                    format!("Unable to load procedures: {e}"),
                ));
                None
            }
        }
    }

    pub fn items_loaded(&mut self, seq: u64, result: HttpResult) {
        if seq != self.fetch_seq {
            debug!(seq, current = self.fetch_seq, "superseded procedure fetch dropped");
            return;
        }
        self.items_loading = false;
        match decode::<Vec<Procedure>>(result) {
            Ok(items) => {
                debug!(count = items.len(), "procedures loaded");
                self.items = items;
                self.error = None;
            }
            Err(e) => {
                warn!(error = %e, "procedure load failed");
                self.items.clear();
                self.error = Some(
                    AppError::new(ErrorKind::Fetch, format!("Unable to load procedures: {e}"))
                        .with_internal(format!("{e:?}")),
                );
            }
        }
    }

    pub fn references_loaded(&mut self, result: HttpResult) {
        self.references = match decode::<Vec<Ambulance>>(result) {
            Ok(ambulances) => References::Loaded(ambulances),
            Err(e) => {
                let error = AppError::new(ErrorKind::ReferenceLoad, e.to_string())
                    .with_internal(format!("{e:?}"));
                warn!(%error, "ambulance references unavailable, showing raw ids");
                References::Unavailable
            }
        };
    }

    /// Marks a row as pending approval. Returns `false` when the request is
    /// ignored because the row is already pending or unknown.
    pub fn begin_approval(&mut self, id: &EntityId) -> bool {
        if self.pending.contains(id) {
            debug!(%id, "approval already pending");
            return false;
        }
        if !self.items.iter().any(|item| item.id() == id) {
            debug!(%id, "approval ignored, unknown procedure");
            return false;
        }
        self.error = None;
        self.pending.insert(id.clone());
        true
    }

    /// Approval call issued once the artificial delay has elapsed.
    pub fn approval_request(&mut self, id: &EntityId) -> Option<ApiRequest> {
        let request = self.client.as_ref()?.approve_procedure(id);
        match request {
            Ok(request) => Some(request),
            Err(e) => {
                self.pending.remove(id);
                self.error = Some(AppError::new(ErrorKind::Transition, e.to_string()));
                None
            }
        }
    }

    pub fn finish_approval(&mut self, id: &EntityId, result: HttpResult) {
        self.pending.remove(id);
        match accept(result) {
            Ok(_) => {
                if let Some(item) = self.items.iter_mut().find(|item| item.id() == id) {
                    item.visit_type = VisitType::Approved;
                }
                info!(%id, "procedure approved");
            }
            Err(e) => {
                warn!(%id, error = %e, "approval failed");
                let message = approval_failure_message(&e);
                self.error = Some(
                    AppError::new(ErrorKind::Transition, message)
                        .with_context("procedure_id", id.to_string()),
                );
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn ambulance_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.references.resolve(id)
    }

    pub fn parent(&self) -> Option<&EntityId> {
        self.parent.as_ref()
    }

    /// Resolved name of the parent filter, if the list is filtered.
    pub fn parent_name(&self) -> Option<&str> {
        self.parent
            .as_ref()
            .map(|parent| self.ambulance_name(parent.as_str()))
    }

    pub fn items(&self) -> &[Procedure] {
        &self.items
    }

    pub fn references(&self) -> &References {
        &self.references
    }

    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.items_loading || self.references.is_pending()
    }

    pub fn is_pending(&self, id: &EntityId) -> bool {
        self.pending.contains(id)
    }
}

fn approval_failure_message(cause: &ServiceError) -> String {
    match cause {
        ServiceError::Status { .. } => cause.body().unwrap_or(APPROVAL_FAILED).to_string(),
        other => other.to_string(),
    }
}
