pub mod engine;
pub mod fs;
pub mod matcher;
pub mod query;
pub mod session;
pub mod sort;
pub mod store;
pub mod util;
pub mod walker;
