use std::fmt;
use std::str::FromStr;

use crate::error::ConvertError;
use crate::model::{GridOrigin, ResampledGrid};

/// Coordinate systems accepted by Therion's `cs` directive for surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CoordinateSystem {
    /// S-JTSK with the raw negative (GIS) coordinates.
    #[default]
    Ijtsk,
    /// S-JTSK with positive coordinates.
    Jtsk,
    Utm33n,
    Utm34n,
    Wgs84,
}

impl CoordinateSystem {
    pub const ALL: [CoordinateSystem; 5] = [
        CoordinateSystem::Ijtsk,
        CoordinateSystem::Jtsk,
        CoordinateSystem::Utm33n,
        CoordinateSystem::Utm34n,
        CoordinateSystem::Wgs84,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            CoordinateSystem::Ijtsk => "ijtsk",
            CoordinateSystem::Jtsk => "jtsk",
            CoordinateSystem::Utm33n => "utm33n",
            CoordinateSystem::Utm34n => "utm34n",
            CoordinateSystem::Wgs84 => "wgs84",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CoordinateSystem::Ijtsk => "S-JTSK (JTSK03, Inverted Y)",
            CoordinateSystem::Jtsk => "S-JTSK (JTSK03)",
            CoordinateSystem::Utm33n => "UTM 33N",
            CoordinateSystem::Utm34n => "UTM 34N",
            CoordinateSystem::Wgs84 => "WGS 84 (Lat/Lon)",
        }
    }

    pub fn example(&self) -> &'static str {
        match self {
            CoordinateSystem::Ijtsk => "X: -377168, Y: -1200776",
            CoordinateSystem::Jtsk => "X: 377168, Y: 1200776",
            CoordinateSystem::Utm33n => "X: 582155, Y: 5333156",
            CoordinateSystem::Utm34n => "X: 339034, Y: 5349764",
            CoordinateSystem::Wgs84 => "Lat: 48.14, Lon: 17.10",
        }
    }

    /// Adjusts a lower-left grid origin to this system's sign convention.
    ///
    /// Only `jtsk` changes anything: X is negated and Y is taken from the
    /// opposite edge of the resampled extent before negation.
    pub fn apply(&self, origin: GridOrigin, resampled: &ResampledGrid) -> GridOrigin {
        match self {
            CoordinateSystem::Jtsk => GridOrigin {
                x: -origin.x,
                y: -(origin.y + (resampled.height as f64 * resampled.pixel_size_y)),
            },
            CoordinateSystem::Ijtsk
            | CoordinateSystem::Utm33n
            | CoordinateSystem::Utm34n
            | CoordinateSystem::Wgs84 => origin,
        }
    }
}

pub fn apply_coordinate_system(
    origin: GridOrigin,
    resampled: &ResampledGrid,
    system: CoordinateSystem,
) -> GridOrigin {
    system.apply(origin, resampled)
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for CoordinateSystem {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CoordinateSystem::ALL
            .into_iter()
            .find(|cs| cs.id() == s)
            .ok_or_else(|| ConvertError::UnsupportedCoordinateSystem(s.to_string()))
    }
}
