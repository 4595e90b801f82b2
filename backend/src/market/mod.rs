pub mod binance;
pub mod source;

pub use source::SnapshotSource;
