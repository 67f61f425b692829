//! Binds `window-cache` collections to the `virtualizer` crate.
//!
//! `window-cache` knows which rows are loaded; `virtualizer` knows which rows are on screen. This
//! crate wires the two together the way an adapter usually needs:
//!
//! - the virtualizer's range (with overscan) drives `request`
//! - the virtualizer's count follows the cache's `row_count_hint`
//! - rows render with their load state (`RowState`)
//!
//! Like `window-cache` it performs no I/O and holds no UI objects.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod list;

#[cfg(test)]
mod tests;

pub use list::{Completed, WindowedList};
