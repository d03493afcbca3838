pub mod error;
pub mod statement;
pub mod value;

pub use error::{ConfigError, DbError, EngineError, Operation, Result};
pub use statement::{BoundStatement, Params};
pub use value::Value;
