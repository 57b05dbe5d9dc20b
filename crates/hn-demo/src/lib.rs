//! # hn-demo
//!
//! Number partitioning plug-in: instance model, loader, validator and a
//! configurable multistart metaheuristic with its component catalog.

mod algorithms;
mod generator;
mod model;

pub use algorithms::{Constructive, Improver, Multistart, Strategy};
pub use generator::{catalog, PartitionGenerator, ROOT};
pub use model::{Partition, PartitionInstance, PartitionLoader, PartitionValidator};
