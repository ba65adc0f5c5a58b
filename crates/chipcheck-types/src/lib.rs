//! Shared types for the chipcheck stream reducer.

mod sdk;
mod stream;

pub use sdk::*;
pub use stream::*;
