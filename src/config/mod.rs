//! Configuration: schema structs and file loading.

pub mod loader;
pub mod schema;
