//! Liquid-level tracking across a run of fixed-volume aliquot transfers.
//!
//! The entry point is [`LiquidLevelTracker`]. Build it with the two tube handles,
//! the volume to move and the aliquot size, then call
//! [`next_positions`](LiquidLevelTracker::next_positions) before each transfer
//! (or iterate it) until it reports completion.

use crate::error::Result;
use crate::tube::{TubeBounds, TubeHeightModel, validate_volume};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// What to do when the last aliquot is larger than what is left in the source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalStepPolicy {
    /// Transfer the full aliquot anyway; the bookkeeping goes negative.
    #[default]
    Reproduce,
    /// Shorten the last transfer to exactly the remaining volume.
    ClampToRemaining,
}

/// Configuration for liquid-level tracking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Normalized travel shared by the source and destination tubes.
    pub bounds: TubeBounds,
    /// How far below the source surface the tip is held. Default: 0.5.
    pub submersion_offset: f64,
    pub final_step: FinalStepPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            bounds: TubeBounds::default(),
            submersion_offset: 0.5,
            final_step: FinalStepPolicy::Reproduce,
        }
    }
}

/// A tube handle paired with a normalized height inside it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TubePosition<T> {
    pub tube: T,
    pub height: f64,
}

impl<T> TubePosition<T> {
    /// Offset from the tube centre, as the instrument layer addresses it.
    pub fn offset(&self) -> DVec3 {
        DVec3::new(0.0, 0.0, self.height)
    }
}

/// Coordinates and volume for one aliquot transfer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferStep<T> {
    /// Zero-based step number.
    pub index: usize,
    /// Volume to move in this step.
    pub volume: f64,
    /// Where to aspirate.
    pub source: TubePosition<T>,
    /// Where to dispense.
    pub destination: TubePosition<T>,
}

/// Produces aspirate/dispense positions that follow a draining source and a
/// filling destination.
///
/// Each call to [`next_positions`](Self::next_positions) reports the positions
/// for the current liquid levels, then advances both tubes by one aliquot.
#[derive(Clone, Debug)]
pub struct LiquidLevelTracker<T> {
    source_tube: T,
    destination_tube: T,
    source: TubeHeightModel,
    destination: TubeHeightModel,
    transfer_volume: f64,
    remaining_volume: f64,
    final_step: FinalStepPolicy,
    steps_taken: usize,
}

impl<T: Clone> LiquidLevelTracker<T> {
    /// Sets up tracking for moving `initial_volume` from `source_tube` to
    /// `destination_tube` in aliquots of `transfer_volume`.
    ///
    /// # Errors
    ///
    /// Fails with an [`InvalidRequest`](crate::ErrorKind::InvalidRequest) error if
    /// a volume is not finite and positive, or the config's bounds or offset are invalid.
    pub fn new(
        source_tube: T,
        destination_tube: T,
        initial_volume: f64,
        transfer_volume: f64,
        config: &TrackerConfig,
    ) -> Result<Self> {
        validate_volume("transfer volume", transfer_volume)?;
        let source =
            TubeHeightModel::source(config.bounds, initial_volume, config.submersion_offset)?;
        let destination = TubeHeightModel::destination(config.bounds, initial_volume)?;

        Ok(Self {
            source_tube,
            destination_tube,
            source,
            destination,
            transfer_volume,
            remaining_volume: initial_volume,
            final_step: config.final_step,
            steps_taken: 0,
        })
    }

    /// Returns the positions for the next transfer, or `None` once the full
    /// volume has been moved.
    pub fn next_positions(&mut self) -> Option<TransferStep<T>> {
        if self.is_complete() {
            return None;
        }

        let volume = match self.final_step {
            FinalStepPolicy::Reproduce => self.transfer_volume,
            FinalStepPolicy::ClampToRemaining => self.transfer_volume.min(self.remaining_volume),
        };
        if volume > self.remaining_volume {
            warn!(
                volume,
                remaining = self.remaining_volume,
                "final transfer exceeds remaining source volume"
            );
        }

        let step = TransferStep {
            index: self.steps_taken,
            volume,
            source: TubePosition {
                tube: self.source_tube.clone(),
                height: self.source.position(),
            },
            destination: TubePosition {
                tube: self.destination_tube.clone(),
                height: self.destination.position(),
            },
        };
        trace!(
            step = step.index,
            source = step.source.height,
            destination = step.destination.height,
            "transfer positions"
        );

        self.source.transfer(volume);
        self.destination.transfer(volume);
        self.remaining_volume -= volume;
        self.steps_taken += 1;

        if self.is_complete() {
            debug!(
                steps = self.steps_taken,
                remaining = self.remaining_volume,
                "liquid transfer complete"
            );
        }
        Some(step)
    }

    /// Whether the full volume has been moved.
    pub fn is_complete(&self) -> bool {
        self.remaining_volume <= 0.0
    }

    /// Volume still to be moved. Negative after an overdrawn final step.
    pub fn remaining_volume(&self) -> f64 {
        self.remaining_volume
    }

    /// Number of transfers still to come.
    pub fn remaining_steps(&self) -> usize {
        if self.is_complete() {
            return 0;
        }
        (self.remaining_volume / self.transfer_volume).ceil() as usize
    }

    /// Number of transfers handed out so far.
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// Aliquot size requested at construction.
    pub fn transfer_volume(&self) -> f64 {
        self.transfer_volume
    }

    /// Height model of the tube being drained.
    pub fn source(&self) -> &TubeHeightModel {
        &self.source
    }

    /// Height model of the tube being filled.
    pub fn destination(&self) -> &TubeHeightModel {
        &self.destination
    }
}

impl<T: Clone> Iterator for LiquidLevelTracker<T> {
    type Item = TransferStep<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_positions()
    }
}
