pub mod json;
pub mod multipart;
pub mod pagination;
pub mod path;
pub mod query;
pub mod valid;

pub use json::Json;
pub use multipart::Multipart;
pub use pagination::{PAGE_SIZE, PaginationParams, page_count};
pub use path::Path;
pub use query::Query;
pub use valid::Valid;
