pub mod aggregate;
pub mod config;
pub mod config_file;
pub mod ctx;
pub mod get_terminal_width;
pub mod output_table;
pub mod run_log;
pub mod stats;
pub mod tagged_line;
pub mod utillib;
