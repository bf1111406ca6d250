pub mod catalog;
pub mod logging;
pub mod error_logging;

pub use catalog::{InMemorySource, JsonCatalogSource};
pub use logging::{Logger, LoggerTrait};
pub use error_logging::{ErrorLogger, ErrorType};
