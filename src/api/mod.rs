//! Google API clients and record model
//!
//! Firestore supplies the raw survey and response documents; Drive receives
//! the finished workbook. Both clients share the credential handling in
//! `crate::auth` and speak plain REST through reqwest.

pub mod document;
pub mod drive;
pub mod firestore;
pub mod value;

pub use document::{Document, FlattenedDocument, flatten_document};
pub use drive::DriveClient;
pub use firestore::FirestoreClient;
pub use value::FieldValue;
