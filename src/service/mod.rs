//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services validate existence rules and orchestrate repository calls.

mod author;
mod cheep;

pub use author::AuthorService;
pub use cheep::CheepService;
