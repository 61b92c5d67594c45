pub mod inventory;

pub use inventory::*;
