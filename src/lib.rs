pub mod api;
pub mod config;
pub mod dates;
pub mod nav;
pub mod records;
pub mod state;
pub mod util;
