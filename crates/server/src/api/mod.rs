pub mod extensions;
pub mod handlers;
pub mod middleware;
pub mod proxy;
pub mod routes;
pub mod sources;

pub use routes::create_router;
