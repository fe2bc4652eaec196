pub mod config;
pub mod decimal;
pub mod error;
pub mod metrics;
pub mod stats;
pub mod table;
pub mod types;

pub use bigdecimal::BigDecimal;
pub use config::*;
pub use decimal::*;
pub use error::*;
pub use table::*;
pub use types::*;
