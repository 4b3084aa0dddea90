pub mod chart_output_adapter;
pub mod console_output_adapter;
pub mod json_output_adapter;

pub use chart_output_adapter::FileChartOutputAdapter;
pub use console_output_adapter::ConsoleReportOutputAdapter;
pub use json_output_adapter::JsonReportOutputAdapter;
