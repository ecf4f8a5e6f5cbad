pub mod backtest_parser;
pub mod numeric;
pub mod optimization_parser;
pub mod preset_store;
pub mod selection;
pub mod set_file;
