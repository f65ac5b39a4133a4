//! Host resource probing for the status endpoint.
#![deny(unused_crate_dependencies)]

mod gpu;
mod probe;

pub use probe::SysinfoProbe;
