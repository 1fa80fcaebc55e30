pub mod applet;
pub mod client;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "test-helpers"))]
pub mod fake;
pub mod models;
pub mod options;
pub mod poller;
pub mod resolver;
pub mod slug;

pub use applet::TravisApplet;
pub use client::TravisClient;
pub use config::{AppletConfig, TravisConfig};
pub use error::TravisError;
