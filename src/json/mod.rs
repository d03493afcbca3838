//! JSON to SQL translation
//!
//! Key-value payloads and filters go in, bound SQL statements come out.
//!
//! - `codec.rs` - payload to INSERT / UPDATE, statement builders
//! - `condition.rs` - filter map to WHERE clause
//! - `identity.rs` - generated `id` / `timestamp` values
//! - `validator.rs` - identifier allowlisting and quoting

pub mod codec;
pub mod condition;
pub mod identity;
pub mod validator;

pub use codec::{
    Assignment, DeleteStatementBuilder, EncodedInsert, InsertStatementBuilder, RecordCodec,
    SelectStatementBuilder, UpdateStatementBuilder,
};
pub use condition::{Combinator, Condition, ConditionBuilder};
pub use identity::{Identity, IdentityGenerator};

/// Field name to value, in the caller's key order.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Field name to expected value, in the caller's key order.
pub type Filter = Payload;
