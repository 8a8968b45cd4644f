mod board;
mod catalog;
mod engine;
mod error;
mod guard;
pub mod payment;
mod rng;
mod serialize;
mod state;
pub mod turmoil;

pub use crate::board::*;
pub use crate::catalog::*;
pub use crate::engine::*;
pub use crate::error::*;
pub use crate::guard::*;
pub use crate::rng::*;
pub use crate::serialize::*;
pub use crate::state::*;
