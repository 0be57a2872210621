pub mod entity;
pub mod hooks;
pub mod manager;
pub mod models;
pub mod repository;

pub use entity::{Entity, FieldErrors};
pub use hooks::{SessionScope, TransactionHook};
pub use manager::{Database, DatabaseError};
pub use repository::{Filters, Page, Repository};
