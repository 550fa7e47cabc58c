pub mod monitor;
pub mod poller;

pub use monitor::PriceMonitor;
pub use poller::{RefreshPoller, RefreshSummary};
