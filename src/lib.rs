//! # pipette-state
//!
//! Resource bookkeeping for liquid-handling robot protocols.
//!
//! Two independent pieces of state are modelled, both owned by the protocol
//! driver for the lifetime of one run:
//!
//! * [`TipRackAllocator`] tracks which tips of a rack have been used and hands
//!   out contiguous blocks so a multi-channel pipette can pick up several tips
//!   at once.
//! * [`LiquidLevelTracker`] follows the liquid surface of a source and a
//!   destination tube through a series of aliquot transfers, using volume
//!   bookkeeping alone, so the tip stays submerged without leaving the tube.
//!
//! Translating the returned wells and tube offsets into instrument commands is
//! left to the caller.

pub mod allocator;
pub mod error;
pub mod rack;
pub mod tracker;
pub mod tube;

pub use allocator::*;
pub use error::*;
pub use rack::*;
pub use tracker::*;
pub use tube::*;
