mod confidence;

pub use confidence::*;
