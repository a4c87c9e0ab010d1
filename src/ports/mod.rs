//! Port traits at the I/O seams.

pub mod chart_port;
pub mod config_port;
pub mod page_port;
pub mod table_port;
