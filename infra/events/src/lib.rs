//! # Event Bus
//!
//! A small, synchronous listener registry used for model lifecycle hooks.
//!
//! ## Overview
//!
//! An [`EventBus`] stores listeners per event key. Emitting runs every listener
//! registered for that key on the calling thread, in registration order.
//! Several buses can be combined at dispatch time with [`dispatch`], which is how
//! class-level listeners are consulted together with instance-level ones.
//!
//! ## Features
//!
//! * **Generic**: any `Copy + Eq + Hash` key and any payload type.
//! * **Once listeners**: removed before their first invocation.
//! * **Detached unsubscription**: a [`Subscription`] never keeps its bus alive.
//! * **Lock discipline**: listeners always run after the registry lock is released,
//!   so a listener may freely subscribe, unsubscribe or emit.
//!
//! # Example
//!
//! ```rust
//! use amodel_event_bus::EventBus;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Kind { Saved }
//!
//! let bus = EventBus::<Kind, u64>::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//! let counter = hits.clone();
//! let sub = bus.on(Kind::Saved, move |id: &u64| {
//!     counter.fetch_add(usize::try_from(*id).unwrap_or(0), Ordering::SeqCst);
//! });
//!
//! bus.emit(Kind::Saved, &2);
//! assert!(sub.unsubscribe());
//! bus.emit(Kind::Saved, &40);
//! assert_eq!(hits.load(Ordering::SeqCst), 2);
//! ```

mod bus;

pub use bus::{EventBus, EventKey, Listener, ListenerId, Subscription, dispatch};
