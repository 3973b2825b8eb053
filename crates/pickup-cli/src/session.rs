// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use pickup_app::{
    AddressField, AddressType, DraftEdit, PickupWindow, Quote, ScheduleOutcome, ScheduleWorkflow,
    WorkflowEvent,
};
use time::Date;
use tracing::info;

use crate::runtime::ServiceRuntime;

/// Form values supplied on the command line. Unset contact fields keep the
/// defaults resolved from the quote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInput {
    pub date: Option<Date>,
    pub window: Option<PickupWindow>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub address_type: Option<AddressType>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionReport {
    Completed {
        outcome: ScheduleOutcome,
        quote: Option<Quote>,
    },
    /// The workflow stayed open with this message on screen.
    Stopped { error: String },
}

/// Drives one workflow headlessly: fill the form, verify, submit. `today` is
/// asked for the date at the moment of submission.
pub fn run_session(
    quote: &Quote,
    input: SessionInput,
    runtime: &mut ServiceRuntime,
    today: impl Fn() -> Date,
) -> Result<SessionReport> {
    let mut workflow = ScheduleWorkflow::open(quote);
    info!(mode = workflow.title(), "starting pickup session");

    // ZIP first so explicit city/state win over autofill.
    if let Some(zip) = input.zip {
        runtime.dispatch(workflow.edit(DraftEdit::Address(AddressField::ZipCode, zip)));
        runtime.settle(&mut workflow)?;
    }

    let mut edits = Vec::new();
    if let Some(street) = input.street {
        edits.push(DraftEdit::Address(AddressField::Street, street));
    }
    if let Some(city) = input.city {
        edits.push(DraftEdit::Address(AddressField::City, city));
    }
    if let Some(state) = input.state {
        edits.push(DraftEdit::Address(AddressField::State, state));
    }
    if let Some(kind) = input.address_type {
        edits.push(DraftEdit::AddressType(kind));
    }
    if let Some(name) = input.name {
        edits.push(DraftEdit::ContactName(name));
    }
    if let Some(phone) = input.phone {
        edits.push(DraftEdit::ContactPhone(phone));
    }
    if let Some(text) = input.instructions {
        edits.push(DraftEdit::SpecialInstructions(text));
    }
    edits.push(DraftEdit::ScheduledDate(input.date));
    edits.push(DraftEdit::PickupWindow(input.window));
    for edit in edits {
        runtime.dispatch(workflow.edit(edit));
    }
    runtime.settle(&mut workflow)?;

    runtime.dispatch(workflow.verify_address());
    runtime.settle(&mut workflow)?;
    if let Some(error) = workflow.error() {
        return Ok(SessionReport::Stopped {
            error: error.to_owned(),
        });
    }

    let mut observed = runtime.dispatch(workflow.submit(today()));
    observed.extend(runtime.settle(&mut workflow)?);

    let completed = observed.into_iter().find_map(|event| match event {
        WorkflowEvent::Completed { quote, outcome } => {
            Some(SessionReport::Completed { outcome, quote })
        }
        _ => None,
    });
    Ok(completed.unwrap_or_else(|| SessionReport::Stopped {
        error: workflow
            .error()
            .unwrap_or("pickup was not scheduled")
            .to_owned(),
    }))
}
