//! Background and request-scoped services.

pub mod asset_proxy;
pub mod transient_sweeper;

pub use asset_proxy::AssetProxy;
pub use transient_sweeper::{SweeperHandle, TransientSweeper};
