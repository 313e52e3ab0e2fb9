mod skip;

pub use skip::*;
