//! Object storage for droply.
//!
//! Everything here is a proxy to the remote store plus part-size
//! arithmetic; no database access. Backends implement [`ObjectStore`] and
//! are selected once at startup by [`factory::create_store`].

mod factory;
mod keys;
mod mock;
mod s3;
mod traits;

pub use factory::create_store;
pub use keys::object_key;
pub use mock::MockStore;
pub use s3::S3Store;
pub use traits::{
    part_count, MultipartUpload, ObjectStore, StorageError, StorageResult, UploadedPart,
    PART_SIZE,
};
