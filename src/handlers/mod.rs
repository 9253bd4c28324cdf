pub mod health_handlers;
pub mod user_handlers;

pub use health_handlers::{api_handler, health_handler, root_handler};
pub use user_handlers::{delete_user, get_user, list_users, update_user};
