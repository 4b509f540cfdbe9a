//! Frame fan-out for the Lifecast streams.
//!
//! A [`Hub`] keeps the set of currently watching [`Sink`]s and pushes
//! every published [`Frame`](lifecast_render::Frame) to all of them
//! without ever waiting on a slow one.
//!
//! # Ownership
//!
//! ```text
//! session ──owns──> Sink ──handle()──> SinkHandle <──holds── Hub
//!    │                                                      ▲
//!    └──owns──> Registration ──leave on release/drop────────┘
//! ```
//!
//! The session is the only owner of its [`Sink`]. The hub holds a
//! [`SinkHandle`], which can offer a frame but never keeps the sink alive
//! in any meaningful way: once the session drops its sink, deliveries to
//! the handle report [`Delivery::Closed`].

pub mod hub;
pub mod sink;

pub use hub::{Hub, PublishReport, Registration};
pub use sink::{Delivery, Sink, SinkHandle, SinkId};
