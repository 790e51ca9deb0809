#![doc(html_root_url = "https://docs.rs/shortcircuit-dom/0.0.1")]
#![warn(clippy::pedantic)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

#[cfg(test)]
mod arena;

pub mod apply;
pub mod boot;
pub mod config;
pub mod connection;
pub mod edit;
pub mod error;
pub mod events;
pub mod frame;
pub mod path;
pub mod session;
pub mod tree;
pub mod web;

pub use boot::{start, start_with};
pub use config::Config;
