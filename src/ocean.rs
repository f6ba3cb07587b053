//! Coarse ocean field
//!
//! One sample per region, read from the global "Ocean Map" layer and re-keyed so that
//! the centre of that layer sits at region `(0, 0)`. The value decides whether a region
//! is generated at all or filled with water.

use std::collections::HashMap;

use crate::chunk::RegionCoord;
use crate::noise_field::NoiseField;

/// At or below this value a region is open water and skips noise generation
pub const DEEP_OCEAN_MAX: f32 = 0.01;
/// Lower (exclusive) bound of the shallow band
pub const SHALLOW_OCEAN_MIN: f32 = 0.3;
/// Upper (inclusive) bound of the shallow band
pub const SHALLOW_OCEAN_MAX: f32 = 0.4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OceanClass {
    Deep,
    Shallow,
    Land,
}

impl OceanClass {
    pub fn from_value(value: f32) -> Self {
        if value <= DEEP_OCEAN_MAX {
            OceanClass::Deep
        } else if value > SHALLOW_OCEAN_MIN && value <= SHALLOW_OCEAN_MAX {
            OceanClass::Shallow
        } else {
            OceanClass::Land
        }
    }
}

/// Sparse region → ocean value map. Read-only after construction.
#[derive(Clone, Debug, Default)]
pub struct OceanField {
    values: HashMap<RegionCoord, f32>,
}

impl OceanField {
    /// Re-key a noise field around its centre cell `(width / 2, height / 2)`.
    pub fn from_field(field: &NoiseField) -> Self {
        let center_x = (field.width / 2) as i32;
        let center_y = (field.height / 2) as i32;
        let values = field
            .iter()
            .map(|(x, y, &v)| (RegionCoord::new(x as i32 - center_x, y as i32 - center_y), v))
            .collect();
        Self { values }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (RegionCoord, f32)>) -> Self {
        Self {
            values: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, region: RegionCoord) -> Option<f32> {
        self.values.get(&region).copied()
    }

    pub fn classify(&self, region: RegionCoord) -> Option<OceanClass> {
        self.get(region).map(OceanClass::from_value)
    }

    pub fn contains(&self, region: RegionCoord) -> bool {
        self.values.contains_key(&region)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Regions within `radius` of the origin on both axes that have an ocean sample,
    /// row-major with `y` outermost.
    pub fn regions_within(&self, radius: i32) -> Vec<RegionCoord> {
        let radius = radius.max(0);
        (-radius..=radius)
            .flat_map(|y| (-radius..=radius).map(move |x| RegionCoord::new(x, y)))
            .filter(|region| self.contains(*region))
            .collect()
    }
}
