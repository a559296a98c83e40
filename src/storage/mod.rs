mod adaptors;
mod preference_store;

pub use adaptors::*;
pub use preference_store::*;
