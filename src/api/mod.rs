pub mod response;
pub mod routes;
pub mod users;

pub use response::ApiResponse;
pub use routes::build_router;
