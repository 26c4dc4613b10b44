//! Service layer for the user accounts server.
//! - `storage`: file-backed JSON map with snapshot persistence.
//! - `users`: user records, password hashing and the `UserRepository` seam.

pub mod errors;
pub mod storage;
pub mod users;
