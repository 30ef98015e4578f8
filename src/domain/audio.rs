//! Audio port: where the auto-response clip comes from

use async_trait::async_trait;
use bytes::Bytes;

/// Source of the pre-recorded response clip
///
/// Implementations read lazily on every call; nothing is cached.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// The clip bytes, `Ok(None)` if the clip does not exist
    async fn load(&self) -> std::io::Result<Option<Bytes>>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}
