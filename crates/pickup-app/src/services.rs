// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    CancellationToken, RequestId, ScheduleRequest, ScheduleResponse, ServiceFailure,
    VerificationResponse, WorkflowId, ZipLookup,
};

/// The three backend services the workflow talks to. Calls block; hosts
/// run them off the thread that owns the workflow.
pub trait PickupServices: Send + Sync {
    fn lookup_zip(&self, zip: &str) -> Result<ZipLookup, ServiceFailure>;
    fn verify_address(&self, address: &str) -> Result<VerificationResponse, ServiceFailure>;
    fn schedule_pickup(&self, request: &ScheduleRequest)
    -> Result<ScheduleResponse, ServiceFailure>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCallKind {
    ZipLookup { zip: String },
    VerifyAddress { address: String },
    SchedulePickup(Box<ScheduleRequest>),
}

impl ServiceCallKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ZipLookup { .. } => "zip_lookup",
            Self::VerifyAddress { .. } => "verify_address",
            Self::SchedulePickup(_) => "schedule_pickup",
        }
    }
}

/// A request the workflow wants performed on its behalf.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCall {
    pub workflow: WorkflowId,
    pub request: RequestId,
    pub kind: ServiceCallKind,
    pub cancel: CancellationToken,
}

impl ServiceCall {
    pub fn execute(&self, services: &dyn PickupServices) -> ServiceResponse {
        let outcome = match &self.kind {
            ServiceCallKind::ZipLookup { zip } => ServiceOutcome::ZipLookup(services.lookup_zip(zip)),
            ServiceCallKind::VerifyAddress { address } => {
                ServiceOutcome::VerifyAddress(services.verify_address(address))
            }
            ServiceCallKind::SchedulePickup(request) => {
                ServiceOutcome::SchedulePickup(services.schedule_pickup(request))
            }
        };
        ServiceResponse {
            workflow: self.workflow,
            request: self.request,
            outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse {
    pub workflow: WorkflowId,
    pub request: RequestId,
    pub outcome: ServiceOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceOutcome {
    ZipLookup(Result<ZipLookup, ServiceFailure>),
    VerifyAddress(Result<VerificationResponse, ServiceFailure>),
    SchedulePickup(Result<ScheduleResponse, ServiceFailure>),
}
