pub mod inventory;
pub mod perf;

pub use inventory::*;
pub use perf::*;
