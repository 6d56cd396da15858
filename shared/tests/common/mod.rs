#![allow(dead_code)]

use crux_core::testing::AppTester;
use crux_core::Request;
use crux_http::protocol::{HttpRequest, HttpResponse, HttpResult};
use serde::Serialize;
use shared::capabilities::{SignalOperation, TimerOperation, TimerOutput};
use shared::model::{Ambulance, EntityId, Procedure, VisitType};
use shared::{App, Effect, Event, Model};

pub const BASE: &str = "http://localhost:8080/api";

/// Effects of one step, sorted by capability.
#[derive(Default)]
pub struct Effects {
    pub renders: usize,
    pub http: Vec<Request<HttpRequest>>,
    pub timers: Vec<Request<TimerOperation>>,
    pub signals: Vec<SignalOperation>,
}

impl Effects {
    pub fn http_request(&self, index: usize) -> &HttpRequest {
        &self.http[index].operation
    }

    /// Takes the pending HTTP request whose URL ends with `suffix`.
    pub fn take_http(&mut self, suffix: &str) -> Request<HttpRequest> {
        let index = self
            .http
            .iter()
            .position(|r| r.operation.url.ends_with(suffix))
            .unwrap_or_else(|| panic!("no pending request ending with {suffix}"));
        self.http.remove(index)
    }

    pub fn take_timer(&mut self) -> Request<TimerOperation> {
        assert!(!self.timers.is_empty(), "no pending timer");
        self.timers.remove(0)
    }
}

pub fn sort(effects: Vec<Effect>) -> Effects {
    let mut sorted = Effects::default();
    for effect in effects {
        match effect {
            Effect::Render(_) => sorted.renders += 1,
            Effect::Http(request) => sorted.http.push(request),
            Effect::Timer(request) => sorted.timers.push(request),
            Effect::Signal(request) => sorted.signals.push(request.operation),
        }
    }
    sorted
}

pub struct Harness {
    pub app: AppTester<App, Effect>,
    pub model: Model,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            app: AppTester::<App, Effect>::default(),
            model: Model::default(),
        }
    }

    pub fn send(&mut self, event: Event) -> Effects {
        let update = self.app.update(event, &mut self.model);
        sort(update.effects)
    }

    fn feed(&mut self, events: Vec<Event>, mut effects: Vec<Effect>) -> Effects {
        for event in events {
            effects.extend(self.app.update(event, &mut self.model).effects);
        }
        sort(effects)
    }

    pub fn respond(&mut self, request: &mut Request<HttpRequest>, result: HttpResult) -> Effects {
        let update = self.app.resolve(request, result).expect("http request resolves");
        self.feed(update.events, update.effects)
    }

    pub fn elapse(&mut self, request: &mut Request<TimerOperation>) -> Effects {
        let update = self
            .app
            .resolve(request, TimerOutput::Elapsed)
            .expect("timer resolves");
        self.feed(update.events, update.effects)
    }

    pub fn view(&self) -> shared::ViewModel {
        self.app.view(&self.model)
    }
}

pub fn json<T: Serialize>(status: u16, value: &T) -> HttpResult {
    let body = serde_json::to_vec(value).expect("fixture serializes");
    HttpResult::Ok(HttpResponse::status(status).body(body).build())
}

/// Response whose body is exactly `body`, as the service wrote it.
pub fn text(status: u16, body: &str) -> HttpResult {
    HttpResult::Ok(HttpResponse::status(status).body(body).build())
}

pub fn connection_refused() -> HttpResult {
    HttpResult::Err(crux_http::Error::Io("connection refused".into()))
}

/// Decoded JSON payload of a captured request.
pub fn sent_json(request: &HttpRequest) -> serde_json::Value {
    serde_json::from_slice(&request.body).expect("request body is JSON")
}

pub fn ambulance(id: &str, name: &str) -> Ambulance {
    Ambulance {
        id: EntityId::new(id),
        name: name.into(),
        location: "Bratislava".into(),
        department: "Surgery".into(),
        capacity: 2,
        status: "Occupied".into(),
    }
}

pub fn procedure(id: &str, ambulance_id: &str) -> Procedure {
    Procedure {
        id: EntityId::new(id),
        description: format!("procedure {id}"),
        patient: "Jana Nováková".into(),
        price: 35.0,
        visit_type: VisitType::Unapproved,
        payer: "VšZP".into(),
        ambulance_id: EntityId::new(ambulance_id),
    }
}
