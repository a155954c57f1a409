//! Query and aggregation layer over the observation store.
//!
//! [`ClimateQueries`] composes the window resolver and the aggregation engine
//! into the named queries served by the HTTP routes.

pub mod aggregate;
pub mod error;
pub mod facade;
pub mod window;

pub use aggregate::*;
pub use error::*;
pub use facade::*;
pub use window::*;
