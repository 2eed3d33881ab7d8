// Extract and load: raw resources in, raw table out

pub mod csv;
pub mod extractor;
pub mod loader;
pub mod write_pool;

pub use extractor::{CsvFileExtractor, Extractor, RawResource, SyntheticExtractor};
pub use loader::{LoadReport, RawLoader};
pub use write_pool::WritePool;
