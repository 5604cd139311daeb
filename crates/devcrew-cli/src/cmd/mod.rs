pub mod memory;
pub mod milestone;
pub mod project;
