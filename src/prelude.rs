//! Everything needed for day-to-day use of [`JsonDb`](crate::JsonDb).

pub use crate::{
    Combinator, ConnectionConfig, DbError, Filter, Inserted, JsonDb, Payload, Record, Result,
    Schema, Status, load_schema, parse_schema,
};
