pub mod extractor;
pub mod observer;
pub mod page;
pub mod router_client;
