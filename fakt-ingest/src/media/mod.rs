//! Local image mirroring
//!
//! Performer artwork is copied into the static directory rather than
//! hot-linked from the search service.

pub mod fs_mirror;

pub use fs_mirror::FsImageMirror;

use crate::error::MirrorError;
use async_trait::async_trait;
use std::collections::BTreeMap;

#[async_trait]
pub trait ImageMirror: Send + Sync {
    /// Mirror `src_url` under `key`; returns variant name → public path
    async fn mirror(
        &self,
        src_url: &str,
        key: &str,
    ) -> Result<BTreeMap<String, String>, MirrorError>;
}
