//! # hoverplay Relay
//!
//! The command channel between the content layer and the privileged
//! background context.
//!
//! ## Pieces
//!
//! - [`RelayClient`] - Typed commands over any [`RelayTransport`](hoverplay_protocols::RelayTransport)
//! - [`wire`] - The `{cmd, args}` / `{data}` / `{error}` message codec
//! - [`RelayDispatcher`] - Background-side validation boundary in front of a [`RelayHandler`]
//! - [`formats`] - Raw stream format normalisation
//! - [`signature`] - Versioned stream signature decoding
//! - [`ScriptedRelay`] - A canned background used by tests and the replay CLI

mod client;
mod dispatch;
pub mod formats;
mod scripted;
pub mod signature;
pub mod wire;

pub use client::RelayClient;
pub use dispatch::{RelayDispatcher, RelayHandler};
pub use formats::normalize_formats;
pub use scripted::{RelayScript, ScriptedRelay};
pub use signature::{CipherStep, SignatureAlgorithm, SignatureDecoder};
pub use wire::{MessagePort, PortTransport, WireReply, WireRequest};
