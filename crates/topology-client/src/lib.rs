//! Client-side reconciliation for the live topology view.
//!
//! A viewer holds one [`TopologyGraph`](topology_graph::TopologyGraph) per
//! session. Broadcast deltas are merged into it as they arrive; positions
//! change only through layout runs the user asks for and through drags.
//! Selection is tracked alongside and never leaves the client.
//!
//! # Modules
//!
//! - [`reconciler`] -- Applying server messages to the graph
//! - [`selection`] -- None / node / edge selection state machine
//! - [`session`] -- [`ClientSession`] tying graph, selection and layout
//!   together
//! - [`error`] -- [`ClientError`]

pub mod error;
pub mod reconciler;
pub mod selection;
pub mod session;

pub use error::ClientError;
pub use reconciler::{ApplyOutcome, IgnoreReason, ReconcilerState, apply};
pub use selection::{Selection, SelectionEvent};
pub use session::{ALERT_FEED_CAPACITY, ClientSession, LayoutRequest};
