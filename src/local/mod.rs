pub mod analyze;
pub mod monitor;
pub mod process_file;
pub mod server;
