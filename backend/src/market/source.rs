use async_trait::async_trait;
use engine::{Snapshot, Window};

use crate::error::FetchError;

/// Supplies one snapshot for a (symbol, window) pair.
///
/// Implementations must not retry internally; the caller bounds each fetch
/// with its own timeout and treats any error as "skip this key this tick".
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    async fn fetch(&self, symbol: &str, window: Window) -> Result<Snapshot, FetchError>;
}
