// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use pickup_app::{
    PickupServices, RequestId, ScheduleWorkflow, ServiceCall, ServiceResponse, WorkflowEvent,
};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
pub enum RuntimeEvent {
    Response(ServiceResponse),
    /// The owning workflow closed before the call finished.
    Abandoned { request: RequestId },
}

/// Runs workflow service calls on worker threads and feeds the results
/// back to the workflow on the caller's thread.
pub struct ServiceRuntime {
    services: Arc<dyn PickupServices>,
    tx: Sender<RuntimeEvent>,
    rx: Receiver<RuntimeEvent>,
    in_flight: usize,
    response_timeout: Duration,
}

impl ServiceRuntime {
    pub fn new(services: Arc<dyn PickupServices>, response_timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            services,
            tx,
            rx,
            in_flight: 0,
            response_timeout,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Starts a worker for every requested call and hands back the rest.
    pub fn dispatch(&mut self, events: Vec<WorkflowEvent>) -> Vec<WorkflowEvent> {
        let mut remaining = Vec::with_capacity(events.len());
        for event in events {
            match event {
                WorkflowEvent::CallRequested(call) => self.spawn(call),
                other => remaining.push(other),
            }
        }
        remaining
    }

    fn spawn(&mut self, call: ServiceCall) {
        debug!(
            workflow = %call.workflow,
            request = %call.request,
            call = call.kind.name(),
            "starting service call"
        );
        let services = Arc::clone(&self.services);
        let tx = self.tx.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            let event = if call.cancel.is_cancelled() {
                RuntimeEvent::Abandoned {
                    request: call.request,
                }
            } else {
                let response = call.execute(services.as_ref());
                if call.cancel.is_cancelled() {
                    RuntimeEvent::Abandoned {
                        request: call.request,
                    }
                } else {
                    RuntimeEvent::Response(response)
                }
            };
            let _ = tx.send(event);
        });
    }

    /// Delivers responses until no call is in flight, dispatching any
    /// follow-up calls the workflow requests along the way.
    pub fn settle(&mut self, workflow: &mut ScheduleWorkflow) -> Result<Vec<WorkflowEvent>> {
        let mut observed = Vec::new();
        while self.in_flight > 0 {
            let event = self
                .rx
                .recv_timeout(self.response_timeout)
                .map_err(|error| match error {
                    RecvTimeoutError::Timeout => anyhow!(
                        "timed out after {:?} waiting for {} service call(s)",
                        self.response_timeout,
                        self.in_flight
                    ),
                    RecvTimeoutError::Disconnected => anyhow!("service worker channel closed"),
                })?;
            self.in_flight -= 1;

            match event {
                RuntimeEvent::Response(response) => {
                    let events = workflow.handle_response(response);
                    observed.extend(self.dispatch(events));
                }
                RuntimeEvent::Abandoned { request } => {
                    debug!(%request, "dropped result of cancelled call");
                }
            }
        }
        Ok(observed)
    }
}
