//! Request extractors that reject with the uniform JSON error body.

pub mod entity;
pub mod fields;
pub use entity::EntityPath;
pub use fields::FieldBody;
