pub mod config;
pub mod error;
pub mod form;
pub mod io;
pub mod state;
