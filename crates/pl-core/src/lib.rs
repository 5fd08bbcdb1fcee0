//! pl-core: shared foundation for pressloop.
//!
//! Contains:
//! - numeric (Real + finiteness and vector-norm helpers)
//! - units (uom SI types + conversions used for reporting)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
