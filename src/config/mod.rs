pub mod settings;
pub mod tables;
pub mod loader;
pub mod validator;
pub mod resolved;

pub use settings::*;
pub use tables::*;
pub use loader::*;
pub use validator::*;
pub use resolved::*;
