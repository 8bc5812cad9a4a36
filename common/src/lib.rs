pub mod cache;
pub mod error;
pub mod eyelevel;
pub mod session;
pub mod utils;
