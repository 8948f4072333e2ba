//! Classification labels.
//!
//! The model emits one score per class; `Label` maps the class index
//! back to a meaning.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two classes the model distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Background road noise (class index 0).
    TrafficNoise,
    /// An ambulance siren (class index 1).
    Ambulance,
}

impl Label {
    /// All labels in model output order.
    pub const ALL: [Label; 2] = [Label::TrafficNoise, Label::Ambulance];

    /// Map a model output index to a label.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::TrafficNoise),
            1 => Some(Self::Ambulance),
            _ => None,
        }
    }

    /// The model output index of this label.
    pub const fn index(self) -> usize {
        match self {
            Self::TrafficNoise => 0,
            Self::Ambulance => 1,
        }
    }

    /// Stable identifier used in the history log.
    pub const fn slug(self) -> &'static str {
        match self {
            Self::TrafficNoise => "traffic_noise",
            Self::Ambulance => "ambulance",
        }
    }

    #[inline]
    pub const fn is_ambulance(self) -> bool {
        matches!(self, Self::Ambulance)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrafficNoise => write!(f, "Traffic Noise"),
            Self::Ambulance => write!(f, "Ambulance"),
        }
    }
}
