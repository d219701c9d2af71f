//! Configuration and deck payload loading.

pub mod file_provider;
pub mod load;
pub mod schema;

pub use file_provider::*;
pub use load::*;
pub use schema::*;
