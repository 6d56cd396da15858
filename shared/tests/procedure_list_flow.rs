mod common;

use assert_matches::assert_matches;
use common::*;
use shared::capabilities::{SignalOperation, TimerOperation};
use shared::event::ListConfig;
use shared::model::VisitType;
use shared::view::{ListBody, ListView, ProcedureRow};
use shared::{Event, ViewModel};

fn list_view(harness: &Harness) -> ListView {
    match harness.view() {
        ViewModel::ProcedureList(view) => view,
        other => panic!("expected procedure list, got {other:?}"),
    }
}

fn rows(harness: &Harness) -> Vec<ProcedureRow> {
    match list_view(harness).body {
        ListBody::Table { rows, .. } => rows,
        ListBody::Loading => panic!("list still loading"),
    }
}

/// Opens an unfiltered list and settles both initial fetches.
fn loaded_list(harness: &mut Harness) {
    let mut effects = harness.send(Event::ProcedureListOpened(ListConfig::unfiltered(BASE)));
    let mut items = effects.take_http("/procedures");
    let mut references = effects.take_http("/ambulances");
    harness.respond(
        &mut items,
        json(200, &vec![procedure("P1", "A1"), procedure("P2", "A2"), procedure("P3", "A1")]),
    );
    harness.respond(&mut references, json(200, &vec![ambulance("A1", "Central")]));
}

fn approve(harness: &mut Harness, id: &str) -> Effects {
    harness.send(Event::ApproveRequested {
        procedure_id: id.into(),
    })
}

#[test]
fn unfiltered_list_resolves_ambulance_names() {
    let mut h = Harness::new();
    let mut effects = h.send(Event::ProcedureListOpened(ListConfig::unfiltered(BASE)));
    assert_eq!(effects.http.len(), 2);
    assert_eq!(list_view(&h).body, ListBody::Loading);

    let mut items = effects.take_http("/procedures");
    assert_eq!(items.operation.url, "http://localhost:8080/api/procedures");
    assert_eq!(items.operation.method, "GET");
    let mut references = effects.take_http("/ambulances");

    h.respond(&mut references, json(200, &vec![ambulance("A1", "Central")]));
    assert_eq!(list_view(&h).body, ListBody::Loading);
    h.respond(&mut items, json(200, &vec![procedure("P1", "A1"), procedure("P2", "A2")]));

    let view = list_view(&h);
    assert_eq!(view.error, None);
    let ListBody::Table { heading, show_ambulance_column, rows } = view.body else {
        panic!("expected table");
    };
    assert_eq!(heading, None);
    assert!(show_ambulance_column);
    assert_eq!(rows[0].ambulance.as_deref(), Some("Central"));
    assert_eq!(rows[1].ambulance.as_deref(), Some("A2"), "unknown ids fall back to raw id");
}

#[test]
fn filtered_list_uses_nested_endpoint_and_heading() {
    let mut h = Harness::new();
    let mut effects = h.send(Event::ProcedureListOpened(ListConfig::for_ambulance(BASE, "A1")));
    let mut items = effects.take_http("/ambulances/A1/procedures");
    let mut references = effects.take_http("/ambulances");

    h.respond(&mut items, json(200, &vec![procedure("P1", "A1")]));
    h.respond(&mut references, json(200, &vec![ambulance("A1", "Central")]));

    let ListBody::Table { heading, show_ambulance_column, rows } = list_view(&h).body else {
        panic!("expected table");
    };
    assert_eq!(heading.as_deref(), Some("Central"));
    assert!(!show_ambulance_column);
    assert_eq!(rows[0].ambulance, None);
}

#[test]
fn item_failure_shows_banner_and_empty_table() {
    let mut h = Harness::new();
    let mut effects = h.send(Event::ProcedureListOpened(ListConfig::unfiltered(BASE)));
    let mut items = effects.take_http("/procedures");
    let mut references = effects.take_http("/ambulances");

    h.respond(&mut references, text(500, ""));
    h.respond(&mut items, text(503, "Service restarting"));

    let view = list_view(&h);
    assert_eq!(
        view.error.as_deref(),
        Some("Unable to load procedures: Service restarting")
    );
    assert_matches!(view.body, ListBody::Table { rows, .. } if rows.is_empty());
}

#[test]
fn approval_waits_then_updates_single_row() {
    let mut h = Harness::new();
    loaded_list(&mut h);
    let before = rows(&h);

    let mut effects = approve(&mut h, "P2");
    assert!(effects.http.is_empty(), "no call before the delay elapses");
    let mut timer = effects.take_timer();
    assert_eq!(timer.operation, TimerOperation::Delay { millis: 1500 });

    let pending = rows(&h);
    assert!(pending[1].approving);
    assert!(!pending[1].can_approve);
    assert!(pending[0].can_approve, "other rows stay actionable");

    let repeat = approve(&mut h, "P2");
    assert!(repeat.timers.is_empty(), "pending row ignores a second trigger");

    let mut effects = h.elapse(&mut timer);
    let mut call = effects.take_http("/procedures/P2");
    assert_eq!(call.operation.method, "PUT");
    assert_eq!(
        sent_json(&call.operation),
        serde_json::json!({"visit_type": "Schválená"})
    );

    h.respond(&mut call, json(200, &serde_json::json!({})));
    let after = rows(&h);
    assert_eq!(after.len(), before.len());
    assert_eq!(after[1].visit_type, VisitType::Approved);
    assert!(!after[1].approving);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
    assert_eq!(after[1].description, before[1].description);
}

#[test]
fn distinct_rows_approve_concurrently() {
    let mut h = Harness::new();
    loaded_list(&mut h);

    let mut first = approve(&mut h, "P1").take_timer();
    let mut second = approve(&mut h, "P3").take_timer();

    let mut call_three = h.elapse(&mut second).take_http("/procedures/P3");
    let mut call_one = h.elapse(&mut first).take_http("/procedures/P1");

    h.respond(&mut call_three, text(200, ""));
    h.respond(&mut call_one, text(200, ""));

    let rows = rows(&h);
    assert_eq!(rows[0].visit_type, VisitType::Approved);
    assert_eq!(rows[1].visit_type, VisitType::Unapproved);
    assert_eq!(rows[2].visit_type, VisitType::Approved);
}

#[test]
fn approval_failures_surface_in_banner() {
    let cases = [
        (text(409, "Procedure already billed"), "Procedure already billed"),
        (text(500, "server busy"), "server busy"),
        (text(500, ""), "Approval failed"),
    ];

    for (result, expected) in cases {
        let mut h = Harness::new();
        loaded_list(&mut h);

        let mut timer = approve(&mut h, "P1").take_timer();
        let mut call = h.elapse(&mut timer).take_http("/procedures/P1");
        h.respond(&mut call, result);

        let view = list_view(&h);
        assert_eq!(view.error.as_deref(), Some(expected));
        let rows = rows(&h);
        assert_eq!(rows[0].visit_type, VisitType::Unapproved);
        assert!(rows[0].can_approve, "row is actionable again after failure");
    }
}

#[test]
fn approval_transport_failure_shows_error_text() {
    let mut h = Harness::new();
    loaded_list(&mut h);

    let mut timer = approve(&mut h, "P1").take_timer();
    let mut call = h.elapse(&mut timer).take_http("/procedures/P1");
    h.respond(&mut call, connection_refused());

    let error = list_view(&h).error.expect("banner shown");
    assert!(error.contains("connection refused"), "got {error}");
    assert!(rows(&h)[0].can_approve);
}

#[test]
fn refresh_ignores_superseded_responses() {
    let mut h = Harness::new();
    loaded_list(&mut h);

    let mut stale = h.send(Event::RefreshRequested).take_http("/procedures");
    assert_eq!(list_view(&h).body, ListBody::Loading);
    let mut fresh = h.send(Event::RefreshRequested).take_http("/procedures");

    h.respond(&mut fresh, json(200, &vec![procedure("P9", "A1")]));
    h.respond(&mut stale, json(200, &Vec::<shared::model::Procedure>::new()));

    let rows = rows(&h);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "P9");
    assert_eq!(rows[0].ambulance.as_deref(), Some("Central"), "references are kept");
}

#[test]
fn refresh_refetches_items_only() {
    let mut h = Harness::new();
    loaded_list(&mut h);
    let effects = h.send(Event::RefreshRequested);
    assert_eq!(effects.http.len(), 1);
    assert!(effects.http_request(0).url.ends_with("/procedures"));
}

#[test]
fn selection_signals_the_shell() {
    let mut h = Harness::new();
    loaded_list(&mut h);

    let effects = h.send(Event::ProcedureSelected { id: "P2".into() });
    assert_eq!(
        effects.signals,
        vec![SignalOperation::ItemSelected { id: "P2".into() }]
    );

    let effects = h.send(Event::NewProcedureRequested);
    assert_eq!(
        effects.signals,
        vec![SignalOperation::ItemSelected { id: "@new".into() }]
    );
}

#[test]
fn approval_for_closed_list_is_dropped() {
    let mut h = Harness::new();
    loaded_list(&mut h);
    let mut timer = approve(&mut h, "P1").take_timer();

    h.send(Event::ComponentClosed);
    let effects = h.elapse(&mut timer);
    assert!(effects.http.is_empty());
    assert_eq!(effects.renders, 0);
}
