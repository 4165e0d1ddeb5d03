// Application layer - the card ledger service.
// Every operation that mutates state runs in a single transaction and
// validates character names against the registry before touching storage.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
