//! RMT Storage
//!
//! Async store traits for the directory (users, groups, projects), artifacts,
//! traces, comments and document metadata, plus [`InMemoryStorage`], the
//! reference implementation, and [`SeedData`] for populating it.

mod memory;
mod seed;
mod traits;

pub use memory::InMemoryStorage;
pub use seed::SeedData;
pub use traits::{
    ArtifactStore, CommentStore, DeletionReport, DirectoryStore, DocumentStore, Storage,
    StorageResult, TraceInsert, TraceStore,
};
