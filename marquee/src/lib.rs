pub mod domain;
pub mod mapping;
pub mod ports;
pub mod proxy;
pub mod rotation;
pub mod routes;

pub use proxy::ProxyService;
pub use routes::RouteTable;
