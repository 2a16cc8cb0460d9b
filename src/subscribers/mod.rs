//! # Event subscribers.
//!
//! [`Subscribe`] is the extension point for reacting to supervisor lifecycle events
//! (logging, metrics, alerting). The [`SubscriberSet`] drives each subscriber from its
//! own bounded queue so a slow subscriber never blocks the supervisor.
//!
//! ## Architecture
//! ```text
//!   runner / stopper ── publish(Event) ──► Bus ──► supervisor listener
//!                                                       │
//!                                                 SubscriberSet::emit
//!                                                 ┌─────┴─────┐
//!                                                 ▼           ▼
//!                                             [queue S1]  [queue S2]
//!                                                 ▼           ▼
//!                                             on_event()  on_event()
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
