use serde::{Deserialize, Serialize};

use crux_core::capability::{Capability, CapabilityContext, Operation};

/// Terminal outcome of an editor interaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EditorSignal {
    Stored,
    Deleted,
    Cancelled,
}

impl EditorSignal {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::Deleted => "deleted",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for EditorSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notifications the surrounding shell acts on (navigation, list refresh).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SignalOperation {
    EditorClosed { signal: EditorSignal },
    /// Edit intent for an id, or create intent when the id is the `@new` sentinel.
    ItemSelected { id: String },
}

impl Operation for SignalOperation {
    type Output = ();
}

pub struct Signal<Ev> {
    context: CapabilityContext<SignalOperation, Ev>,
}

impl<Ev> Capability<Ev> for Signal<Ev> {
    type Operation = SignalOperation;
    type MappedSelf<MappedEv> = Signal<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Signal::new(self.context.map_event(f))
    }
}

impl<Ev> Signal<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<SignalOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn editor_closed(&self, signal: EditorSignal) {
        self.notify(SignalOperation::EditorClosed { signal });
    }

    pub fn item_selected(&self, id: impl Into<String>) {
        self.notify(SignalOperation::ItemSelected { id: id.into() });
    }

    fn notify(&self, operation: SignalOperation) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(operation).await;
        });
    }
}
