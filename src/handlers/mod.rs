pub mod preset_handler;
pub mod report_handler;
