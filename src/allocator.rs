//! Contiguous tip allocation for multi-channel pipettes.
//!
//! A multi-channel pipette seats its channels on adjacent wells of one rack
//! column, so picking up `n` tips needs `n` free wells in an unbroken vertical
//! run. The pipette is then sent to the *top* well of that run.

use crate::error::{Error, Result};
use crate::rack::{RackGeometry, TipLocation, TipRack};
use tracing::{debug, warn};

/// Hands out blocks of tips from a single [`TipRack`].
///
/// Columns are drained left to right. Within a column the search starts at the
/// bottom row and moves up, taking the first unbroken run of `n` free tips.
/// Scattered free tips are never combined into one pickup.
#[derive(Clone, Debug)]
pub struct TipRackAllocator {
    rack: TipRack,
}

impl TipRackAllocator {
    /// Creates an allocator over a full rack.
    pub fn new(geometry: RackGeometry) -> Result<Self> {
        Ok(Self {
            rack: TipRack::new(geometry)?,
        })
    }

    /// Wraps an existing, possibly partially used, rack.
    pub fn from_rack(rack: TipRack) -> Self {
        Self { rack }
    }

    pub fn rack(&self) -> &TipRack {
        &self.rack
    }

    /// Mutable access for recording tips used outside the allocator.
    pub fn rack_mut(&mut self) -> &mut TipRack {
        &mut self.rack
    }

    pub fn into_rack(self) -> TipRack {
        self.rack
    }

    /// Largest block a single call may request: one tip per row.
    pub fn max_block(&self) -> usize {
        self.rack.geometry().rows
    }

    /// Reserves `n` adjacent tips and returns the well to send the pipette to.
    ///
    /// On success exactly `n` previously free tips are marked consumed and the
    /// topmost well of the block is returned. On failure the rack is unchanged.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidTipCount`] if `n` is zero or exceeds the row count.
    /// * [`Error::OutOfTips`] if no column holds `n` contiguous free tips.
    pub fn allocate(&mut self, n: usize) -> Result<TipLocation> {
        let max = self.max_block();
        if n == 0 || n > max {
            return Err(Error::InvalidTipCount { requested: n, max });
        }

        for column in 0..self.rack.geometry().columns {
            let Some(start) = first_free_run(self.rack.scan_column(column), n) else {
                continue;
            };

            self.rack.take_run(column, start, n);
            let location = self.rack.location_at(column, start + n - 1);
            debug!(
                tips = n,
                well = %location,
                remaining = self.rack.available(),
                "taking tips"
            );
            return Ok(location);
        }

        warn!(
            tips = n,
            remaining = self.rack.available(),
            "tip rack exhausted"
        );
        Err(Error::OutOfTips { requested: n })
    }
}

/// Start index of the first window of `n` free cells, scanning upward.
fn first_free_run(cells: &[bool], n: usize) -> Option<usize> {
    cells
        .windows(n)
        .position(|window| window.iter().all(|&free| free))
}
