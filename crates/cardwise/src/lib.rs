//! Cardwise picks the payment card that earns the most for a purchase.
//!
//! The heart of the crate is [`rewards::resolver`], a pure function from a
//! purchase context and a card catalog to a ranked recommendation list. The
//! surrounding modules supply the storage abstraction, the service facade,
//! and the HTTP boundary that expose it.

pub mod config;
pub mod error;
pub mod rewards;
pub mod telemetry;
