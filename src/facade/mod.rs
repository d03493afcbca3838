mod database;

pub use database::{Inserted, JsonDb, Status};
