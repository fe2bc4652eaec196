mod detector;

pub use detector::{normalize_column_name, ColumnDetector};
