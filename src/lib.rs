//! # packweave
//!
//! This library assembles JavaScript bundler configurations from many small
//! fragments and hands the result to an external bundler. It is designed to be
//! used by the `packweave` command-line tool but can also be embedded in a
//! build server that needs repeatable bundler configurations.
//!
//! ## Quick Example
//!
//! ```
//! use packweave::fragment::{Fragment, FragmentSource};
//! use packweave::merge;
//! use serde_json::json;
//!
//! let base = Fragment::from_json(
//!     FragmentSource::Base,
//!     json!({"resolve": {"modules": ["/app/node_modules"]}, "devtool": false}),
//! )
//! .unwrap();
//! let caller = Fragment::from_json(
//!     FragmentSource::Caller,
//!     json!({"resolve": {"modules": ["/app/lib"]}, "devtool": "source-map"}),
//! )
//! .unwrap();
//!
//! let config = merge::merge(&base, &[caller]);
//! assert_eq!(config.get("devtool").and_then(|v| v.as_str()), Some("source-map"));
//! assert_eq!(config.get("resolve.modules").and_then(|v| v.as_list()).map(Vec::len), Some(2));
//! ```
//!
//! ## Core Concepts
//!
//! - **Fragments (`fragment`)**: Partial configuration trees tagged with the
//!   layer they came from.
//! - **Merging (`merge`)**: Deep merge with last-writer-wins scalars,
//!   concatenated lists and recursively merged maps.
//! - **Settings (`settings`)**: The `.packweave.yaml` file naming the project's
//!   packages, loaders and bundler command.
//! - **Registry (`registry`)**: Fragments registered by a hosting application
//!   that apply to every build.
//! - **Bundler (`bundler`)**: The seam to the external bundler.
//! - **Watching (`watch`)**: Rebuild-on-change sessions.
//!
//! ## Execution Flow
//!
//! The main entry point is the `phases::orchestrator`, which executes the
//! following high-level steps:
//!
//! 1.  **Discovery**: Read package manifests, derive alias and override fragments.
//! 2.  **Composition**: Build the base configuration and merge every layer in
//!     precedence order.
//! 3.  **Orchestration**: Run the bundler once, or start a watch session.

pub mod bundler;
pub mod defaults;
pub mod error;
pub mod fragment;
pub mod merge;
pub mod output;
pub mod phases;
pub mod registry;
pub mod request;
pub mod settings;
pub mod watch;

#[cfg(test)]
mod merge_proptest;
