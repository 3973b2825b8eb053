// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{PickupAddress, RequestId, ServiceFailure, VerificationError, VerificationResponse};

/// `Failed` behaves like `Idle` (verify is offered again) but keeps the
/// reason that was surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VerificationState {
    #[default]
    Idle,
    Verifying {
        request: RequestId,
    },
    Verified,
    Failed {
        reason: String,
    },
}

impl VerificationState {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Verifying { .. } => "Verifying...",
            Self::Verified => "Address Verified",
            Self::Idle | Self::Failed { .. } => "Verify Address",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressVerifier {
    state: VerificationState,
}

impl AddressVerifier {
    pub fn state(&self) -> &VerificationState {
        &self.state
    }

    pub fn is_verified(&self) -> bool {
        self.state == VerificationState::Verified
    }

    pub fn is_verifying(&self) -> bool {
        matches!(self.state, VerificationState::Verifying { .. })
    }

    /// Whether the verify affordance is enabled.
    pub fn can_verify(&self, address: &PickupAddress) -> bool {
        !self.is_verifying() && !address.street.is_empty() && !address.zip_code.is_empty()
    }

    /// Moves to `Verifying` and returns the address string to submit.
    pub fn begin(
        &mut self,
        address: &PickupAddress,
        request: RequestId,
    ) -> Result<String, VerificationError> {
        if self.is_verifying() {
            return Err(VerificationError::InProgress);
        }
        if !address.is_complete() {
            return Err(VerificationError::IncompleteAddress);
        }
        self.state = VerificationState::Verifying { request };
        Ok(address.formatted())
    }

    /// Drops back to `Idle` after an address edit. Returns true when the
    /// state actually moved.
    pub fn invalidate(&mut self) -> bool {
        if self.state == VerificationState::Idle {
            return false;
        }
        self.state = VerificationState::Idle;
        true
    }

    /// Applies the response for `request`. Returns `None` when the response
    /// belongs to a verification that is no longer in flight.
    pub fn complete(
        &mut self,
        request: RequestId,
        result: Result<VerificationResponse, ServiceFailure>,
    ) -> Option<Result<(), VerificationError>> {
        if self.state != (VerificationState::Verifying { request }) {
            return None;
        }

        let outcome = match result {
            Ok(response) if response.verified => Ok(()),
            Ok(response) => Err(VerificationError::rejected(response.error.as_deref())),
            Err(failure) => Err(VerificationError::unavailable(&failure)),
        };

        self.state = match &outcome {
            Ok(()) => VerificationState::Verified,
            Err(error) => VerificationState::Failed {
                reason: error.to_string(),
            },
        };
        Some(outcome)
    }
}
