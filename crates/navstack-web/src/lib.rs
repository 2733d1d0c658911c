#![forbid(unsafe_code)]

//! Browser backend for navstack.
//!
//! This crate provides [`ShellApp`], a `wasm-bindgen`-exported struct that
//! owns a [`navstack_runtime::HistoryBridge`] over `window.history`,
//! `localStorage` and a DOM overlay container, and exposes it to JavaScript.
//!
//! ```js
//! const shell = new ShellApp('{"routes":{"dashboard":"Dashboard"}}', render, bind);
//! shell.start();
//! const id = shell.open('{"title":"Client","body":"<p>…</p>"}');
//! if (await shell.confirm("Delete", "Delete this client?")) { /* … */ }
//! ```
//!
//! The DOM-free parts ([`markup`], [`config`], [`shell_core`]) build and test
//! on every target.

pub mod config;
pub mod markup;
pub mod shell_core;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{ShellApp, WebBackend};

pub use config::{DomConfig, WebShellConfig};
pub use shell_core::ShellCore;
