pub mod compliance;
pub mod federation;
pub mod horizon;
pub mod in_memory;
