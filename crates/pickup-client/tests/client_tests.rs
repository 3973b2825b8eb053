// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use pickup_app::{
    AddressField, DraftEdit, PickupServices, PickupWindow, ScheduleWorkflow, ServiceCall,
    ServiceFailure, WorkflowEvent,
};
use pickup_client::Client;
use pickup_testkit::{PickupFaker, ScriptedServices, fixture_today};
use serde_json::Value;
use std::io::{Cursor, Read};
use std::thread;
use std::time::Duration;
use time::Duration as DateDuration;
use tiny_http::{Header, Method, Response, Server};

fn json_response(body: &str, status: u16) -> Response<Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

fn start_server() -> Result<(Server, String)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());
    Ok((server, addr))
}

#[test]
fn unreachable_backend_maps_to_unreachable() {
    let client =
        Client::new("http://127.0.0.1:1", Duration::from_millis(50)).expect("client should initialize");

    let error = client
        .lookup_zip("97205")
        .expect_err("lookup should fail for unreachable endpoint");
    assert!(matches!(error, ServiceFailure::Unreachable(_)));
    assert!(error.to_string().contains("127.0.0.1:1"));
}

#[test]
fn lookup_zip_sends_query_and_decodes() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.url(), "/api/zipcode?zip=97205");
        request
            .respond(json_response(r#"{"city":"Portland","state":"OR"}"#, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let lookup = client.lookup_zip("97205")?;
    assert_eq!(lookup.resolved(), Some(("Portland", "OR")));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn verify_address_posts_formatted_address() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Post);
        assert_eq!(request.url(), "/api/verify-address");
        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("body should read");
        let parsed: Value = serde_json::from_str(&body).expect("body should be JSON");
        assert_eq!(parsed["address"], "123 Main St, Portland, OR 97205");
        request
            .respond(json_response(
                r#"{"verified":false,"error":"Address not found"}"#,
                200,
            ))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let response = client.verify_address("123 Main St, Portland, OR 97205")?;
    assert!(!response.verified);
    assert_eq!(response.error.as_deref(), Some("Address not found"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn rejected_status_keeps_server_error() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/quote/schedule-pickup");
        request
            .respond(json_response(
                r#"{"success":false,"error":"Quote has expired"}"#,
                410,
            ))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let mut faker = PickupFaker::new(1);
    let request = pickup_app::ScheduleRequest {
        access_token: faker.quote().access_token,
        scheduled_date: "2026-02-20".to_owned(),
        pickup_window: PickupWindow::Evening,
        special_instructions: String::new(),
        contact_name: "Jane Doe".to_owned(),
        contact_phone: "5035551234".to_owned(),
        pickup_address: "123 Main St, Portland, OR 97205".to_owned(),
        address_type: pickup_app::AddressType::Business,
    };
    let error = client
        .schedule_pickup(&request)
        .expect_err("410 should be an error");
    assert_eq!(
        error,
        ServiceFailure::Rejected {
            status: 410,
            message: Some("Quote has expired".to_owned()),
        }
    );

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn malformed_body_is_a_decode_failure() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response("not json", 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client
        .verify_address("1 Elm St, Boise, ID 83702")
        .expect_err("garbage body should fail");
    assert!(matches!(error, ServiceFailure::Decode(_)));

    handle.join().expect("server thread should join");
    Ok(())
}

fn single_call(events: &[WorkflowEvent]) -> ServiceCall {
    let calls: Vec<ServiceCall> = events
        .iter()
        .filter_map(|event| match event {
            WorkflowEvent::CallRequested(call) => Some(call.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(calls.len(), 1, "expected one call in {events:?}");
    calls.into_iter().next().expect("one call")
}

#[test]
fn workflow_schedules_against_mock_backend() -> Result<()> {
    let (server, addr) = start_server()?;
    let mut faker = PickupFaker::new(21);
    let quote = faker.quote();
    let token = quote.access_token.clone();

    let handle = thread::spawn(move || {
        let request = server.recv().expect("zip request expected");
        assert_eq!(request.url(), "/api/zipcode?zip=97205");
        request
            .respond(json_response(r#"{"city":"Portland","state":"OR"}"#, 200))
            .expect("response should succeed");

        let request = server.recv().expect("verify request expected");
        assert_eq!(request.url(), "/api/verify-address");
        request
            .respond(json_response(
                r#"{"verified":true,"normalizedAddress":"123 MAIN ST, PORTLAND, OR 97205"}"#,
                200,
            ))
            .expect("response should succeed");

        let mut request = server.recv().expect("schedule request expected");
        assert_eq!(request.url(), "/api/quote/schedule-pickup");
        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("body should read");
        let parsed: Value = serde_json::from_str(&body).expect("body should be JSON");
        assert_eq!(parsed["accessToken"], token.as_str());
        assert_eq!(parsed["scheduledDate"], "2026-02-22");
        assert_eq!(parsed["pickupWindow"], "afternoon");
        assert_eq!(parsed["pickupAddress"], "123 Main St, Portland, OR 97205");
        assert_eq!(parsed["addressType"], "residence");
        request
            .respond(json_response(
                r#"{"success":true,"quote":{"status":"pickup_scheduled"},"isReschedule":false}"#,
                200,
            ))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let mut workflow = ScheduleWorkflow::open(&quote);

    let call = single_call(&workflow.edit(DraftEdit::Address(
        AddressField::ZipCode,
        "97205".to_owned(),
    )));
    workflow.handle_response(call.execute(&client));
    assert_eq!(workflow.draft().address.city, "Portland");
    assert_eq!(workflow.draft().address.state, "OR");

    workflow.edit(DraftEdit::Address(
        AddressField::Street,
        "123 Main St".to_owned(),
    ));
    let call = single_call(&workflow.verify_address());
    workflow.handle_response(call.execute(&client));
    assert!(workflow.address_verified());

    workflow.edit(DraftEdit::ScheduledDate(Some(
        fixture_today() + DateDuration::days(3),
    )));
    workflow.edit(DraftEdit::PickupWindow(Some(PickupWindow::Afternoon)));
    let call = single_call(&workflow.submit(fixture_today()));
    let events = workflow.handle_response(call.execute(&client));

    let completed = events.iter().find_map(|event| match event {
        WorkflowEvent::Completed { quote, outcome } => Some((quote.clone(), *outcome)),
        _ => None,
    });
    let (updated, outcome) = completed.expect("workflow should complete");
    assert_eq!(
        updated.map(|quote| quote.status),
        Some("pickup_scheduled".to_owned())
    );
    assert_eq!(outcome.message(), "Pickup scheduled successfully");
    assert!(!workflow.is_open());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn committed_pickup_completes_despite_sparse_quote() -> Result<()> {
    let (server, addr) = start_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("schedule request expected");
        assert_eq!(request.url(), "/api/quote/schedule-pickup");
        request
            .respond(json_response(
                r#"{"success":true,"quote":{"accessToken":null,"status":null,"pickupDetails":{"scheduledDate":{"$date":"2026-02-22"}}}}"#,
                200,
            ))
            .expect("response should succeed");
    });

    let local = ScriptedServices::new().with_zip("97205", "Portland", "OR");
    let mut workflow = ScheduleWorkflow::open(&PickupFaker::new(22).quote());
    let call = single_call(&workflow.edit(DraftEdit::Address(
        AddressField::ZipCode,
        "97205".to_owned(),
    )));
    workflow.handle_response(call.execute(&local));
    workflow.edit(DraftEdit::Address(
        AddressField::Street,
        "123 Main St".to_owned(),
    ));
    let call = single_call(&workflow.verify_address());
    workflow.handle_response(call.execute(&local));
    workflow.edit(DraftEdit::ScheduledDate(Some(
        fixture_today() + DateDuration::days(3),
    )));
    workflow.edit(DraftEdit::PickupWindow(Some(PickupWindow::Morning)));

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let call = single_call(&workflow.submit(fixture_today()));
    let events = workflow.handle_response(call.execute(&client));

    let updated = events.iter().find_map(|event| match event {
        WorkflowEvent::Completed { quote, .. } => Some(quote.clone()),
        _ => None,
    });
    let updated = updated.expect("workflow should complete").expect("quote returned");
    assert_eq!(updated.status, "");
    assert!(updated.has_existing_schedule());
    assert_eq!(workflow.error(), None);
    assert!(!workflow.is_open());

    handle.join().expect("server thread should join");
    Ok(())
}
