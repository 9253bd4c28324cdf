pub mod user;

pub use user::{PublicUser, User, UserRole, UserUpdate};
