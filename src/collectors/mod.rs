//! Slab statistics providers.
//!
//! - **slabinfo**: parses the kernel's `/proc/slabinfo` (format 2.x)

pub mod slabinfo;

pub use slabinfo::ProcSlabinfo;
