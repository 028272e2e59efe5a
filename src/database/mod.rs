pub mod collections;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod store;

pub use collections::{Collection, FieldKind, BOOTCAMPS, COURSES, REVIEWS, USERS};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::Repository;
pub use store::{open_store, DatabaseError, Document, Store};
