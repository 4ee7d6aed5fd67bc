pub mod config;
pub mod error;
pub mod io;
pub mod layout;
pub mod log;
pub mod verification;

pub use arcstr;
