//! Volume-to-height bookkeeping for a single tube.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Normalized vertical travel of a tube, measured from its centre.
///
/// The instrument layer maps `lower` to the tube bottom and `upper` to its top.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TubeBounds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for TubeBounds {
    fn default() -> Self {
        Self {
            lower: -1.0,
            upper: 1.0,
        }
    }
}

impl TubeBounds {
    /// Creates validated bounds.
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        let bounds = Self { lower, upper };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Checks that both bounds are finite and `lower < upper`.
    pub fn validate(&self) -> Result<()> {
        if !self.lower.is_finite() || !self.upper.is_finite() || self.lower >= self.upper {
            return Err(Error::InvalidBounds {
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }

    /// Total normalized travel from bottom to top.
    pub fn span(&self) -> f64 {
        self.upper - self.lower
    }

    /// Limits `height` to the tube.
    pub fn clamp(&self, height: f64) -> f64 {
        height.clamp(self.lower, self.upper)
    }
}

/// Which way the liquid surface moves as transfers happen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillDirection {
    /// Liquid is aspirated from this tube; the surface falls from the top.
    Draining,
    /// Liquid is dispensed into this tube; the surface rises from the bottom.
    Filling,
}

/// Tracks the liquid surface of one tube from volume alone.
///
/// The tube is treated as a uniform cylinder: moving `v` out of a reference
/// volume `total` shifts the surface by `v / total` of the full span. Heights
/// are pinned at the bound they move towards and never leave [`TubeBounds`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TubeHeightState")]
pub struct TubeHeightModel {
    bounds: TubeBounds,
    direction: FillDirection,
    total_volume: f64,
    volume: f64,
    height: f64,
    submersion_offset: f64,
}

impl TubeHeightModel {
    /// A full tube about to be drained, surface at the top.
    ///
    /// `submersion_offset` keeps the reported position that far below the surface.
    pub fn source(bounds: TubeBounds, total_volume: f64, submersion_offset: f64) -> Result<Self> {
        bounds.validate()?;
        validate_volume("total volume", total_volume)?;
        if !submersion_offset.is_finite() || submersion_offset < 0.0 {
            return Err(Error::InvalidSubmersionOffset(submersion_offset));
        }
        Ok(Self {
            bounds,
            direction: FillDirection::Draining,
            total_volume,
            volume: total_volume,
            height: bounds.upper,
            submersion_offset,
        })
    }

    /// An empty tube about to receive `total_volume`, surface at the bottom.
    pub fn destination(bounds: TubeBounds, total_volume: f64) -> Result<Self> {
        bounds.validate()?;
        validate_volume("total volume", total_volume)?;
        Ok(Self {
            bounds,
            direction: FillDirection::Filling,
            total_volume,
            volume: 0.0,
            height: bounds.lower,
            submersion_offset: 0.0,
        })
    }

    /// Bounds this tube's heights stay within.
    pub fn bounds(&self) -> TubeBounds {
        self.bounds
    }

    /// Whether this tube drains or fills.
    pub fn direction(&self) -> FillDirection {
        self.direction
    }

    /// Reference volume that spans the whole tube.
    pub fn total_volume(&self) -> f64 {
        self.total_volume
    }

    /// Liquid currently in the tube according to the bookkeeping.
    ///
    /// May go negative for a source that was overdrawn on its last transfer.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Normalized height of the liquid surface.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Depth of the tip below the surface; zero for a destination.
    pub fn submersion_offset(&self) -> f64 {
        self.submersion_offset
    }

    /// Where the pipette tip should go: just under the surface, inside the tube.
    pub fn position(&self) -> f64 {
        self.bounds.clamp(self.height - self.submersion_offset)
    }

    /// Height change caused by moving `volume` in or out.
    pub fn height_delta(&self, volume: f64) -> f64 {
        (volume / self.total_volume) * self.bounds.span()
    }

    /// Whether the surface has reached the bound it moves towards.
    pub fn is_pinned(&self) -> bool {
        match self.direction {
            FillDirection::Draining => self.height <= self.bounds.lower,
            FillDirection::Filling => self.height >= self.bounds.upper,
        }
    }

    /// Applies one transfer of `volume` to this tube.
    pub fn transfer(&mut self, volume: f64) {
        let delta = self.height_delta(volume);
        match self.direction {
            FillDirection::Draining => {
                self.height = if self.is_pinned() {
                    self.bounds.lower
                } else {
                    (self.height - delta).max(self.bounds.lower)
                };
                self.volume -= volume;
            }
            FillDirection::Filling => {
                self.height = if self.is_pinned() {
                    self.bounds.upper
                } else {
                    (self.height + delta).min(self.bounds.upper)
                };
                self.volume += volume;
            }
        }
    }
}

/// Serialized form of [`TubeHeightModel`], checked before use.
#[derive(Deserialize)]
struct TubeHeightState {
    bounds: TubeBounds,
    direction: FillDirection,
    total_volume: f64,
    volume: f64,
    height: f64,
    submersion_offset: f64,
}

impl TryFrom<TubeHeightState> for TubeHeightModel {
    type Error = Error;

    fn try_from(state: TubeHeightState) -> Result<Self> {
        let mut model = match state.direction {
            FillDirection::Draining => {
                Self::source(state.bounds, state.total_volume, state.submersion_offset)?
            }
            FillDirection::Filling => {
                if state.submersion_offset != 0.0 {
                    return Err(Error::InvalidSubmersionOffset(state.submersion_offset));
                }
                Self::destination(state.bounds, state.total_volume)?
            }
        };
        if !state.volume.is_finite() {
            return Err(Error::InvalidVolume {
                name: "volume",
                value: state.volume,
            });
        }
        if !state.height.is_finite()
            || state.height < state.bounds.lower
            || state.height > state.bounds.upper
        {
            return Err(Error::InvalidBounds {
                lower: state.bounds.lower,
                upper: state.bounds.upper,
            });
        }
        model.volume = state.volume;
        model.height = state.height;
        Ok(model)
    }
}

pub(crate) fn validate_volume(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::InvalidVolume { name, value });
    }
    Ok(())
}
