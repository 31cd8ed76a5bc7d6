//! Safe SQL builder: identifiers through the allow-pattern, values as parameters.

mod builder;
pub mod ident;
pub mod params;
pub use builder::*;
pub use ident::{check_field, is_identifier, EntityName};
pub use params::*;
