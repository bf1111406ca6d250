// 四层架构模块
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

// 重新导出主要类型
pub use domain::{CatalogScanner, Finding, Product, ProductSource, ScanReport, ScanSettings};
pub use application::Config;
pub use infrastructure::{ErrorLogger, ErrorType, InMemorySource, JsonCatalogSource, Logger};
pub use presentation::{print_report, DisplayOptions, ScanSummary};
