//! A single-instrument, in-memory limit-order matching engine with
//! bookmark/rollback semantics.
//!
//! Limit orders arrive through [`engine::Engine::add_limit_order`], rest in a
//! price-ordered book and are crossed on arrival with price-time priority.
//! Every state mutation is a reversible [`events::DataEvent`] appended to an
//! undo log, so the whole engine can be rewound to a saved bookmark with
//! [`engine::Engine::rollback`].

pub mod engine;
pub mod errors;
pub mod events;
pub mod orderbook;
pub mod orders;
