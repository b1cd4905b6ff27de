//! Config storage adapters

mod xdg;

pub use xdg::{XdgConfigStore, CONFIG_ENV};
