// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod autofill;
pub mod cancel;
pub mod draft;
pub mod error;
pub mod ids;
pub mod model;
pub mod services;
pub mod validation;
pub mod verification;
pub mod workflow;

pub use autofill::*;
pub use cancel::*;
pub use draft::*;
pub use error::*;
pub use ids::*;
pub use model::*;
pub use services::*;
pub use validation::*;
pub use verification::*;
pub use workflow::*;
