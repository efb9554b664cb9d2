// Solprobe Atoms: pure data, no I/O.

pub mod constants;
pub mod error;
pub mod types;
