pub mod product;
pub mod scanner;

pub use product::{ImageRef, Product, ProductId, PublishStatus};
pub use scanner::{CatalogScanner, Finding, LengthUnit, ProductSource, ScanError, ScanReport, ScanSettings, SourceError};
