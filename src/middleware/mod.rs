pub mod error_detail;
pub mod security_headers;

pub use error_detail::expose_error_detail;
pub use security_headers::add_security_headers;
