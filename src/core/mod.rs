pub mod error;
pub mod types;
pub mod value;

pub use error::{Result, SeedError};
pub use types::DataType;
pub use value::Value;
