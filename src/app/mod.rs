pub mod lookup_use_case;
pub mod ports;
pub mod report_use_case;

pub use lookup_use_case::{LookupField, LookupUseCase, TitleSummary};
pub use report_use_case::{CatalogReport, ReportUseCase};
