mod http;
mod signal;
mod timer;

pub use self::http::{AppHttp, HttpResult, UrlError, ValidatedUrl};
pub use self::signal::{EditorSignal, Signal, SignalOperation};
pub use self::timer::{Timer, TimerOperation, TimerOutput};

pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::event::Event;
use crate::App;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub timer: Timer<Event>,
    pub signal: Signal<Event>,
}
