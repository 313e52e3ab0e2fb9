mod ttl;

pub use ttl::*;
