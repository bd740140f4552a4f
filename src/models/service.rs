use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Flights,
    Hotel,
    Car,
    Activities,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 4] = [Self::Flights, Self::Hotel, Self::Car, Self::Activities];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flights => "flights",
            Self::Hotel => "hotel",
            Self::Car => "car",
            Self::Activities => "activities",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "flights" => Some(Self::Flights),
            "hotel" => Some(Self::Hotel),
            "car" => Some(Self::Car),
            "activities" => Some(Self::Activities),
            _ => None,
        }
    }

    /// Human label used in auto-generated draft names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Flights => "Flights",
            Self::Hotel => "Hotel",
            Self::Car => "Car",
            Self::Activities => "Activities",
        }
    }
}
