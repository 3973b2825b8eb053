// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::sync::atomic::{AtomicU64, Ordering};
use time::Date;
use tracing::{debug, info, warn};

use crate::{
    AddressField, AddressVerifier, AutofillOutcome, CancellationToken, DateRange, DraftChange,
    DraftEdit, Quote, RequestId, ScheduleDraft, ScheduleMode, ScheduleOutcome, ScheduleRequest,
    ScheduleResponse, ServiceCall, ServiceCallKind, ServiceFailure, ServiceOutcome,
    ServiceResponse, SubmissionError, ValidationError, VerificationError, VerificationResponse,
    VerificationState, WorkflowId, ZipAutofill, ZipLookup, allowed_date_range, format_wire_date,
    resolve_contact_defaults, should_resolve, validate_draft,
};

static NEXT_WORKFLOW_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Cancelled,
    Completed,
    Dismissed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Editing,
    Submitting { request: RequestId },
    Closed(CloseReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    CallRequested(ServiceCall),
    AddressAutofilled { city: String, state: String },
    VerificationChanged(VerificationState),
    SubmittingChanged(bool),
    ErrorShown(String),
    ErrorCleared,
    Completed {
        quote: Option<Quote>,
        outcome: ScheduleOutcome,
    },
    Closed(CloseReason),
}

/// One opening of the pickup scheduling dialog. All mutation happens
/// through `&mut self` on the owning thread; network work is handed out as
/// `ServiceCall`s and comes back through `handle_response`.
#[derive(Debug)]
pub struct ScheduleWorkflow {
    id: WorkflowId,
    access_token: String,
    mode: ScheduleMode,
    draft: ScheduleDraft,
    verifier: AddressVerifier,
    autofill: ZipAutofill,
    phase: WorkflowPhase,
    error: Option<String>,
    last_request: RequestId,
    cancel: CancellationToken,
}

impl ScheduleWorkflow {
    pub fn open(quote: &Quote) -> Self {
        let id = WorkflowId::new(NEXT_WORKFLOW_ID.fetch_add(1, Ordering::Relaxed));
        let mode = ScheduleMode::for_quote(quote);
        debug!(workflow = %id, mode = mode.title(), "pickup workflow opened");
        Self {
            id,
            access_token: quote.access_token.clone(),
            mode,
            draft: ScheduleDraft::seeded(resolve_contact_defaults(quote)),
            verifier: AddressVerifier::default(),
            autofill: ZipAutofill::default(),
            phase: WorkflowPhase::Editing,
            error: None,
            last_request: RequestId::new(0),
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> WorkflowId {
        self.id
    }

    pub fn mode(&self) -> ScheduleMode {
        self.mode
    }

    pub fn draft(&self) -> &ScheduleDraft {
        &self.draft
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn verification(&self) -> &VerificationState {
        self.verifier.state()
    }

    pub fn address_verified(&self) -> bool {
        self.verifier.is_verified()
    }

    pub fn zip_loading(&self) -> bool {
        self.autofill.is_loading()
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, WorkflowPhase::Submitting { .. })
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.phase, WorkflowPhase::Closed(_))
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Form controls are disabled while a submission is in flight.
    pub fn controls_enabled(&self) -> bool {
        self.phase == WorkflowPhase::Editing
    }

    pub fn can_verify(&self) -> bool {
        self.controls_enabled() && self.verifier.can_verify(&self.draft.address)
    }

    pub fn has_pending_calls(&self) -> bool {
        self.zip_loading() || self.verifier.is_verifying() || self.is_submitting()
    }

    pub fn title(&self) -> &'static str {
        self.mode.title()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_submitting() {
            self.mode.busy_label()
        } else {
            self.mode.title()
        }
    }

    pub fn verify_label(&self) -> &'static str {
        self.verifier.state().label()
    }

    pub fn allowed_dates(&self, today: Date) -> DateRange {
        allowed_date_range(today)
    }

    pub fn edit(&mut self, edit: DraftEdit) -> Vec<WorkflowEvent> {
        if !self.controls_enabled() {
            debug!(workflow = %self.id, "ignoring edit while controls are disabled");
            return Vec::new();
        }

        let mut events = Vec::new();
        self.clear_error(&mut events);

        if let DraftChange::Address(field) = self.draft.apply(edit) {
            self.invalidate_verification(&mut events);
            if field == AddressField::ZipCode && should_resolve(&self.draft.address.zip_code) {
                let zip = self.draft.address.zip_code.clone();
                let request = self.mint_request();
                self.autofill.begin(&zip, request);
                debug!(workflow = %self.id, %request, zip = %zip, "resolving city/state");
                events.push(self.call(request, ServiceCallKind::ZipLookup { zip }));
            }
        }
        events
    }

    pub fn verify_address(&mut self) -> Vec<WorkflowEvent> {
        if !self.controls_enabled() {
            return Vec::new();
        }

        let mut events = Vec::new();
        let request = self.mint_request();
        match self.verifier.begin(&self.draft.address, request) {
            Ok(address) => {
                self.clear_error(&mut events);
                events.push(WorkflowEvent::VerificationChanged(
                    self.verifier.state().clone(),
                ));
                debug!(workflow = %self.id, %request, "verifying pickup address");
                events.push(self.call(request, ServiceCallKind::VerifyAddress { address }));
            }
            Err(VerificationError::InProgress) => {
                debug!(workflow = %self.id, "verification already in flight");
            }
            Err(error) => self.show_error(error.to_string(), &mut events),
        }
        events
    }

    /// `today` is the host's current local date; it is never cached.
    pub fn submit(&mut self, today: Date) -> Vec<WorkflowEvent> {
        match self.phase {
            WorkflowPhase::Closed(_) => return Vec::new(),
            WorkflowPhase::Submitting { .. } => {
                debug!(workflow = %self.id, error = %SubmissionError::Busy, "ignoring submit");
                return Vec::new();
            }
            WorkflowPhase::Editing => {}
        }

        let mut events = Vec::new();
        let payload = match self.build_request(today) {
            Ok(payload) => payload,
            Err(error) => {
                debug!(workflow = %self.id, %error, "submission blocked by validation");
                self.show_error(SubmissionError::from(error).to_string(), &mut events);
                return events;
            }
        };

        let request = self.mint_request();
        self.phase = WorkflowPhase::Submitting { request };
        self.clear_error(&mut events);
        events.push(WorkflowEvent::SubmittingChanged(true));
        info!(
            workflow = %self.id,
            %request,
            date = %payload.scheduled_date,
            window = payload.pickup_window.as_str(),
            "submitting pickup request"
        );
        events.push(self.call(
            request,
            ServiceCallKind::SchedulePickup(Box::new(payload)),
        ));
        events
    }

    /// The cancel control is disabled while submitting.
    pub fn cancel(&mut self) -> Vec<WorkflowEvent> {
        match self.phase {
            WorkflowPhase::Editing => self.close(CloseReason::Cancelled),
            WorkflowPhase::Submitting { .. } | WorkflowPhase::Closed(_) => Vec::new(),
        }
    }

    /// Host-driven teardown; allowed in any open phase.
    pub fn dismiss(&mut self) -> Vec<WorkflowEvent> {
        if !self.is_open() {
            return Vec::new();
        }
        self.close(CloseReason::Dismissed)
    }

    pub fn handle_response(&mut self, response: ServiceResponse) -> Vec<WorkflowEvent> {
        if !self.is_open() {
            debug!(
                workflow = %self.id,
                request = %response.request,
                "discarding response for closed workflow"
            );
            return Vec::new();
        }
        if response.workflow != self.id {
            debug!(
                workflow = %self.id,
                other = %response.workflow,
                "discarding response addressed to another workflow"
            );
            return Vec::new();
        }

        match response.outcome {
            ServiceOutcome::ZipLookup(result) => self.finish_zip_lookup(response.request, result),
            ServiceOutcome::VerifyAddress(result) => {
                self.finish_verification(response.request, result)
            }
            ServiceOutcome::SchedulePickup(result) => {
                self.finish_submission(response.request, result)
            }
        }
    }

    fn finish_zip_lookup(
        &mut self,
        request: RequestId,
        result: Result<ZipLookup, ServiceFailure>,
    ) -> Vec<WorkflowEvent> {
        let mut events = Vec::new();
        match self
            .autofill
            .complete(request, &self.draft.address.zip_code, result)
        {
            AutofillOutcome::Apply { .. } if !self.controls_enabled() => {
                debug!(workflow = %self.id, %request, "discarding zip autofill during submit");
            }
            AutofillOutcome::Apply { city, state } => {
                let city_changed = self.draft.address.set_field(AddressField::City, city.clone());
                let state_changed = self
                    .draft
                    .address
                    .set_field(AddressField::State, state.clone());
                if city_changed || state_changed {
                    self.invalidate_verification(&mut events);
                }
                events.push(WorkflowEvent::AddressAutofilled { city, state });
            }
            AutofillOutcome::Skipped(error) => {
                debug!(workflow = %self.id, %request, %error, "zip autofill skipped");
            }
            AutofillOutcome::Stale => {
                debug!(workflow = %self.id, %request, "discarding stale zip lookup");
            }
        }
        events
    }

    fn finish_verification(
        &mut self,
        request: RequestId,
        result: Result<VerificationResponse, ServiceFailure>,
    ) -> Vec<WorkflowEvent> {
        let mut events = Vec::new();
        match self.verifier.complete(request, result) {
            None => {
                debug!(workflow = %self.id, %request, "discarding stale verification");
            }
            Some(Ok(())) => {
                self.clear_error(&mut events);
                events.push(WorkflowEvent::VerificationChanged(VerificationState::Verified));
            }
            Some(Err(error)) => {
                warn!(workflow = %self.id, %request, %error, "address verification failed");
                events.push(WorkflowEvent::VerificationChanged(
                    self.verifier.state().clone(),
                ));
                self.show_error(error.to_string(), &mut events);
            }
        }
        events
    }

    fn finish_submission(
        &mut self,
        request: RequestId,
        result: Result<ScheduleResponse, ServiceFailure>,
    ) -> Vec<WorkflowEvent> {
        if self.phase != (WorkflowPhase::Submitting { request }) {
            debug!(workflow = %self.id, %request, "discarding stale submission response");
            return Vec::new();
        }

        let mut events = vec![WorkflowEvent::SubmittingChanged(false)];
        match result {
            Ok(response) if response.success => {
                let outcome = match response.is_reschedule {
                    Some(true) => ScheduleOutcome::Rescheduled,
                    Some(false) => ScheduleOutcome::Scheduled,
                    None => self.mode.outcome(),
                };
                info!(workflow = %self.id, %request, "{}", outcome.message());
                events.push(WorkflowEvent::Completed {
                    quote: response.quote,
                    outcome,
                });
                events.extend(self.close(CloseReason::Completed));
            }
            Ok(response) => {
                let error = SubmissionError::rejected(response.error.as_deref());
                warn!(workflow = %self.id, %request, %error, "pickup request rejected");
                self.phase = WorkflowPhase::Editing;
                self.show_error(error.to_string(), &mut events);
            }
            Err(failure) => {
                warn!(workflow = %self.id, %request, %failure, "pickup request failed");
                self.phase = WorkflowPhase::Editing;
                self.show_error(
                    SubmissionError::unavailable(&failure).to_string(),
                    &mut events,
                );
            }
        }
        events
    }

    fn build_request(&self, today: Date) -> Result<ScheduleRequest, ValidationError> {
        validate_draft(&self.draft, self.verifier.is_verified(), today)?;
        let (Some(date), Some(window)) = (self.draft.scheduled_date, self.draft.pickup_window)
        else {
            return Err(ValidationError::MissingDateOrWindow);
        };
        Ok(ScheduleRequest {
            access_token: self.access_token.clone(),
            scheduled_date: format_wire_date(date),
            pickup_window: window,
            special_instructions: self.draft.special_instructions.clone(),
            contact_name: self.draft.contact_name.clone(),
            contact_phone: self.draft.contact_phone.clone(),
            pickup_address: self.draft.address.formatted(),
            address_type: self.draft.address.address_type,
        })
    }

    fn close(&mut self, reason: CloseReason) -> Vec<WorkflowEvent> {
        self.phase = WorkflowPhase::Closed(reason);
        self.cancel.cancel();
        debug!(workflow = %self.id, ?reason, "pickup workflow closed");
        vec![WorkflowEvent::Closed(reason)]
    }

    fn invalidate_verification(&mut self, events: &mut Vec<WorkflowEvent>) {
        if self.verifier.invalidate() {
            events.push(WorkflowEvent::VerificationChanged(VerificationState::Idle));
        }
    }

    fn mint_request(&mut self) -> RequestId {
        self.last_request = self.last_request.next();
        self.last_request
    }

    fn call(&self, request: RequestId, kind: ServiceCallKind) -> WorkflowEvent {
        WorkflowEvent::CallRequested(ServiceCall {
            workflow: self.id,
            request,
            kind,
            cancel: self.cancel.clone(),
        })
    }

    fn show_error(&mut self, message: String, events: &mut Vec<WorkflowEvent>) {
        self.error = Some(message.clone());
        events.push(WorkflowEvent::ErrorShown(message));
    }

    fn clear_error(&mut self, events: &mut Vec<WorkflowEvent>) {
        if self.error.take().is_some() {
            events.push(WorkflowEvent::ErrorCleared);
        }
    }
}
