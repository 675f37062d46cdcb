//! Document store over SQLite

pub mod collections;
pub mod document;
pub mod init;
pub mod store;
pub mod temporal;
pub mod validation;

pub use collections::*;
pub use document::*;
pub use init::*;
pub use store::*;
pub use temporal::{ext_datetime, is_temporal, CalendarDate, Temporal};
pub use validation::*;
