#[macro_use]
extern crate lazy_static;

pub mod aggregation;
pub mod cache;
pub mod chains;
pub mod cli;
pub mod clients;
pub mod core;
pub mod gas;
pub mod providers;
pub mod resilience;
pub mod utils;

// Re-export commonly used types
pub use aggregation::MetaAggregationService;
pub use cache::{CacheBackend, MemoryBackend, SwapCache};
pub use chains::ChainsService;
pub use clients::{EvmNodeClient, NodePool};
pub use crate::core::{Config, GatewayError, GatewayResult};
pub use gas::GasService;
pub use providers::{AggregationProvider, ProviderRegistry};
