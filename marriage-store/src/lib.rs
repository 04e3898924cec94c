pub mod ceremonies;
pub mod engine;
pub mod error;
pub mod marriages;
pub mod proposals;
mod schema;

pub use engine::Store;
pub use error::StoreError;
