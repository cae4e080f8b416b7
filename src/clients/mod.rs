pub mod node;

pub use node::{EvmNodeClient, NodePool};
