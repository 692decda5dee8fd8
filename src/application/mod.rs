// Application layer - use cases around the settlement engine.
// Data comes in through the ports; the service filters it, runs the engine
// and resolves member details for display.

pub mod error;
pub mod ports;
pub mod reporting;
pub mod service;

pub use error::*;
pub use ports::*;
pub use reporting::*;
pub use service::*;
