//! Value normalization.
//!
//! Native preference stores hold a zoo of platform types (sized numbers,
//! string sets, raw data, dates, platform objects). Everything leaving the
//! engine is first normalized into the closed [`PreferenceValue`] set.

mod native;
mod preference;
mod serializer;

pub use native::*;
pub use preference::*;
pub use serializer::*;

#[cfg(test)]
mod serializer_test;
