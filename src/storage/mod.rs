pub mod db;
pub mod device;
pub mod models;
mod tables;
mod users;

pub use db::{Database, DatabaseError};
pub use device::ClientSessionStore;
pub use tables::*;
