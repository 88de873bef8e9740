//! Vigil Library
//!
//! Polls a vSphere-style management server for inventory and performance
//! counters, organizes the inventory into per-datacenter hierarchies, and
//! issues validated time-series queries against the metrics provider.

pub mod config;
pub mod models;
pub mod services;
pub mod tree;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use services::{
    Inventory, InventoryProvider, PerfProvider, QueryBuilder, QueryError, QueryRequest, QuerySpec,
    ReportService, StatsService, VSphereClient, VmReportTask,
};
pub use tree::{Arena, Hierarchy, IdAllocator, Node, NodeId, TreeError};
pub use utils::{MonitorError, MonitorResult, ScheduledExecutor, ScheduledTask};

#[cfg(test)]
mod tests;
