//! Record formats: the key type, the routing envelope, the signed name entry,
//! and the validator capability that interprets them.

pub mod entry;
pub mod key;
pub mod record;
pub mod validator;

pub use entry::{current_timestamp, NameEntry};
pub use key::{IntoRecordKey, RecordKey, IPNS_PREFIX};
pub use record::Record;
pub use validator::{NameEntryValidator, Validator};
