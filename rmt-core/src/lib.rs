//! RMT Core - Entity Types
//!
//! Pure data structures shared by the storage and API crates: typed ids,
//! enumerations, entities and error enums. No business logic lives here.

mod entities;
mod enums;
mod error;
mod identity;

pub use entities::*;
pub use enums::*;
pub use error::*;
pub use identity::*;
