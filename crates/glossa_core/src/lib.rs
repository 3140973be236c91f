//! Glossa Core Runtime
//!
//! This crate provides the foundational primitives the translation layer is
//! built on:
//!
//! - **Store**: owned state mutated through a single reducer path
//! - **Middleware**: interceptors that see every action before the reducer
//! - **Subscriptions**: listeners notified after each state change
//! - **Components**: presentation units rendered from props
//!
//! # Example
//!
//! ```rust
//! use glossa_core::{Reduce, Store};
//!
//! #[derive(Default)]
//! struct Counter(i32);
//!
//! enum Op {
//!     Add(i32),
//! }
//!
//! impl Reduce<Op> for Counter {
//!     fn reduce(&mut self, op: &Op) -> bool {
//!         let Op::Add(n) = op;
//!         self.0 += n;
//!         *n != 0
//!     }
//! }
//!
//! let store = Store::new(Counter::default());
//! store.dispatch(Op::Add(2));
//! assert_eq!(store.select(|c| c.0), 2);
//! ```

pub mod listeners;
pub mod store;
pub mod view;

pub use listeners::{ListenerId, Subscription};
pub use store::{DirtyFlag, Middleware, Reduce, Store, StoreBuilder};
pub use view::{component_fn, Component, FnComponent};
