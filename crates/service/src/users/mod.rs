//! User accounts: record types, password hashing, and the file-backed store.

pub mod domain;
pub mod errors;
pub mod password;
pub mod repository;
pub mod store;

pub use domain::{NewUser, PublicUser, User, UserPatch};
pub use errors::UserError;
pub use repository::UserRepository;
pub use store::UserStore;
