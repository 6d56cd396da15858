use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

use crate::editor::EditorState;
use crate::event::{AmbulanceField, ProcedureField};
use crate::list::ProcedureList;
use crate::validation::{coerce_capacity, coerce_price, Validate};
use crate::{AMBULANCE_STATUSES, NEW_ENTITY_ID};

/// Opaque service identifier. The reserved value `@new` marks an entity that
/// has not been created yet.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn sentinel() -> Self {
        Self(NEW_ENTITY_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_new(&self) -> bool {
        self.0 == NEW_ENTITY_ID
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifies one mounted component. Every response event carries the mount it
/// was issued for; responses for a retired mount are dropped.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MountId(pub u64);

impl MountId {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for MountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Ambulance,
    Procedure,
}

impl EntityKind {
    /// Collection path segment on the service.
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Ambulance => "ambulances",
            Self::Procedure => "procedures",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Ambulance => "ambulance",
            Self::Procedure => "procedure",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Ambulance {
    pub id: EntityId,
    pub name: String,
    pub location: String,
    pub department: String,
    pub capacity: u32,
    pub status: String,
}

/// Create payload: an ambulance without its identifier.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AmbulanceDraft {
    pub name: String,
    pub location: String,
    pub department: String,
    pub capacity: u32,
    pub status: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VisitType {
    #[default]
    #[serde(rename = "Neschválená")]
    Unapproved,
    #[serde(rename = "Schválená")]
    Approved,
}

impl VisitType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unapproved => "Neschválená",
            Self::Approved => "Schválená",
        }
    }
}

impl fmt::Display for VisitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Procedure {
    pub id: EntityId,
    pub description: String,
    pub patient: String,
    #[serde(serialize_with = "price::serialize")]
    pub price: f64,
    pub visit_type: VisitType,
    pub payer: String,
    pub ambulance_id: EntityId,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProcedureDraft {
    pub description: String,
    pub patient: String,
    #[serde(serialize_with = "price::serialize")]
    pub price: f64,
    pub visit_type: VisitType,
    pub payer: String,
    pub ambulance_id: EntityId,
}

/// Whole amounts are written without a fraction, so an untouched procedure
/// goes back to the service exactly as it was received.
mod price {
    use serde::Serializer;

    /// Largest integer an `f64` holds exactly.
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    #[allow(
        clippy::trivially_copy_pass_by_ref,
        clippy::cast_possible_truncation,
        clippy::float_cmp
    )]
    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.fract() == 0.0 && value.abs() <= MAX_EXACT {
            serializer.serialize_i64(*value as i64)
        } else {
            serializer.serialize_f64(*value)
        }
    }
}

/// Partial update carrying only the approval change.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApprovalPatch {
    pub visit_type: VisitType,
}

impl ApprovalPatch {
    pub const fn approved() -> Self {
        Self {
            visit_type: VisitType::Approved,
        }
    }
}

/// Shared contract of everything an editor can own.
pub trait Entity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Validate + Send + 'static
{
    const KIND: EntityKind;

    /// Typed field update carrying the raw user input.
    type Field: fmt::Debug;
    type Draft: Serialize;

    fn id(&self) -> &EntityId;
    fn set_id(&mut self, id: EntityId);

    /// Default working copy for a not-yet-created entity.
    fn placeholder() -> Self;

    fn apply(&mut self, field: Self::Field);
    fn draft(&self) -> Self::Draft;
}

impl Entity for Ambulance {
    const KIND: EntityKind = EntityKind::Ambulance;

    type Field = AmbulanceField;
    type Draft = AmbulanceDraft;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn placeholder() -> Self {
        Self {
            id: EntityId::sentinel(),
            name: String::new(),
            location: String::new(),
            department: String::new(),
            capacity: 1,
            status: AMBULANCE_STATUSES[0].to_string(),
        }
    }

    fn apply(&mut self, field: AmbulanceField) {
        match field {
            AmbulanceField::Name(value) => self.name = value,
            AmbulanceField::Location(value) => self.location = value,
            AmbulanceField::Department(value) => self.department = value,
            AmbulanceField::Capacity(raw) => self.capacity = coerce_capacity(&raw),
            AmbulanceField::Status(value) => self.status = value,
        }
    }

    fn draft(&self) -> AmbulanceDraft {
        AmbulanceDraft {
            name: self.name.clone(),
            location: self.location.clone(),
            department: self.department.clone(),
            capacity: self.capacity,
            status: self.status.clone(),
        }
    }
}

impl Entity for Procedure {
    const KIND: EntityKind = EntityKind::Procedure;

    type Field = ProcedureField;
    type Draft = ProcedureDraft;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn placeholder() -> Self {
        Self {
            id: EntityId::sentinel(),
            description: String::new(),
            patient: String::new(),
            price: 0.0,
            visit_type: VisitType::Unapproved,
            payer: String::new(),
            ambulance_id: EntityId::default(),
        }
    }

    fn apply(&mut self, field: ProcedureField) {
        match field {
            ProcedureField::Description(value) => self.description = value,
            ProcedureField::Patient(value) => self.patient = value,
            ProcedureField::Price(raw) => self.price = coerce_price(&raw),
            ProcedureField::Payer(value) => self.payer = value,
            ProcedureField::AmbulanceId(value) => self.ambulance_id = EntityId::new(value),
        }
    }

    fn draft(&self) -> ProcedureDraft {
        ProcedureDraft {
            description: self.description.clone(),
            patient: self.patient.clone(),
            price: self.price,
            visit_type: self.visit_type,
            payer: self.payer.clone(),
            ambulance_id: self.ambulance_id.clone(),
        }
    }
}

/// Read-only ambulance snapshot held next to procedures for name lookup.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum References {
    /// The component does not cross-reference ambulances.
    #[default]
    NotUsed,
    Pending,
    Loaded(Vec<Ambulance>),
    /// The fetch failed; lookups fall back to raw ids.
    Unavailable,
}

impl References {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn ambulances(&self) -> &[Ambulance] {
        match self {
            Self::Loaded(ambulances) => ambulances,
            _ => &[],
        }
    }

    /// Display name for an ambulance id, or the id itself when unknown.
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.ambulances()
            .iter()
            .find(|a| a.id.as_str() == id)
            .map_or(id, |a| a.name.as_str())
    }
}

/// The one component currently mounted by the shell.
#[derive(Debug, Default)]
pub enum Component {
    #[default]
    Idle,
    AmbulanceEditor(EditorState<Ambulance>),
    ProcedureEditor(EditorState<Procedure>),
    ProcedureList(ProcedureList),
}

impl Component {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AmbulanceEditor(_) => "ambulance_editor",
            Self::ProcedureEditor(_) => "procedure_editor",
            Self::ProcedureList(_) => "procedure_list",
        }
    }
}

#[derive(Debug, Default)]
pub struct Model {
    pub mount: MountId,
    pub component: Component,
}

impl Model {
    /// Retires the current mount and returns the id for the next one.
    pub fn remount(&mut self) -> MountId {
        self.mount = self.mount.next();
        self.mount
    }

    pub fn is_current(&self, mount: MountId) -> bool {
        self.mount == mount && !matches!(self.component, Component::Idle)
    }
}
