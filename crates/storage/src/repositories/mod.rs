//! Repository layer.
//!
//! Each repository is a zero-sized struct providing CRUD methods that
//! accept `&dyn KeyValueStore` as the first argument.

pub mod profile_index_repo;
pub mod profile_repo;
pub mod template_cache_repo;

pub use profile_index_repo::{ProfileIndex, ProfileIndexRepo, ProfileSummary};
pub use profile_repo::ProfileRepo;
pub use template_cache_repo::TemplateCacheRepo;
