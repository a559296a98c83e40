mod detector;
mod event;
mod filter;
mod lookup;
mod outbox;
mod session;
mod snapshot;

pub use detector::*;
pub use event::*;
pub use filter::*;
pub use lookup::*;
pub use session::*;
pub use snapshot::*;

#[cfg(test)]
mod detector_test;
