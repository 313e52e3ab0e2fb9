mod hybrid;

pub use hybrid::*;
