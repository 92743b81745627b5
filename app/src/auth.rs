pub mod identity;
pub mod middleware;
pub mod password;
pub mod service;

pub use identity::{Authentication, Identity};
pub use middleware::{JwtAuthLayer, jwt_auth_layer};
pub use password::Passwords;
pub use service::{Claims, JwtService};
