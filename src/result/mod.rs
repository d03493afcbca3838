mod result;

pub use result::{QueryResult, Record, Row};
