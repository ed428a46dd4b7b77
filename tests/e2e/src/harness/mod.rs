//! Test harness

mod kb_manager;

pub use kb_manager::TestKbManager;
