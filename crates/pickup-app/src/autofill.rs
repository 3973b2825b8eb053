// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AutofillError, RequestId, ServiceFailure, ZIP_CODE_LEN, ZipLookup};

/// Any 5-character value triggers a lookup; digits are not checked.
pub fn should_resolve(zip: &str) -> bool {
    zip.chars().count() == ZIP_CODE_LEN
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ZipLookupState {
    #[default]
    Idle,
    Resolving {
        request: RequestId,
        zip: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutofillOutcome {
    Apply { city: String, state: String },
    Skipped(AutofillError),
    /// The response targeted a ZIP that is no longer current.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ZipAutofill {
    state: ZipLookupState,
}

impl ZipAutofill {
    pub fn state(&self) -> &ZipLookupState {
        &self.state
    }

    /// Drives the field-level loading indicator.
    pub fn is_loading(&self) -> bool {
        matches!(self.state, ZipLookupState::Resolving { .. })
    }

    /// A newer lookup supersedes any in flight; it is not cancelled, its
    /// response just stops mattering.
    pub fn begin(&mut self, zip: &str, request: RequestId) {
        self.state = ZipLookupState::Resolving {
            request,
            zip: zip.to_owned(),
        };
    }

    pub fn complete(
        &mut self,
        request: RequestId,
        current_zip: &str,
        result: Result<ZipLookup, ServiceFailure>,
    ) -> AutofillOutcome {
        let ZipLookupState::Resolving {
            request: latest,
            zip,
        } = &self.state
        else {
            return AutofillOutcome::Stale;
        };
        if *latest != request {
            return AutofillOutcome::Stale;
        }
        let targeted_current = zip == current_zip;
        self.state = ZipLookupState::Idle;
        if !targeted_current {
            return AutofillOutcome::Stale;
        }

        match result {
            Ok(lookup) => match lookup.resolved() {
                Some((city, state)) => AutofillOutcome::Apply {
                    city: city.to_owned(),
                    state: state.to_owned(),
                },
                None => AutofillOutcome::Skipped(AutofillError::Incomplete),
            },
            Err(failure) => AutofillOutcome::Skipped(AutofillError::Lookup(failure)),
        }
    }
}
