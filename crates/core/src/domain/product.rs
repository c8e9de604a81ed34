use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fixed roster of projects a progress log can be filed under.
///
/// The wire value is what slash-command choices carry and what the database
/// stores; out-of-range values are rejected at the parsing boundary rather
/// than smuggled into a broken variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    TauOs,
    Homepage,
    PhotonBrowser,
    InternalTools,
    Raboneko,
    Andaman,
    Terra,
    Other,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown product value `{0}`")]
pub struct UnknownProduct(pub i64);

impl Product {
    pub const ALL: [Self; 8] = [
        Self::TauOs,
        Self::Homepage,
        Self::PhotonBrowser,
        Self::InternalTools,
        Self::Raboneko,
        Self::Andaman,
        Self::Terra,
        Self::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::TauOs => "tauOS",
            Self::Homepage => "Homepage",
            Self::PhotonBrowser => "photonBrowser",
            Self::InternalTools => "InternalTools",
            Self::Raboneko => "Raboneko (me :3)",
            Self::Andaman => "Andaman",
            Self::Terra => "Terra",
            Self::Other => "Other",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|product| product.label() == label)
    }

    pub fn wire(self) -> i64 {
        match self {
            Self::TauOs => 0,
            Self::Homepage => 1,
            Self::PhotonBrowser => 2,
            Self::InternalTools => 3,
            Self::Raboneko => 4,
            Self::Andaman => 5,
            Self::Terra => 6,
            Self::Other => 7,
        }
    }

    pub fn from_wire(value: i64) -> Result<Self, UnknownProduct> {
        Self::ALL
            .into_iter()
            .find(|product| product.wire() == value)
            .ok_or(UnknownProduct(value))
    }
}

#[cfg(test)]
mod tests {
    use super::{Product, UnknownProduct};

    #[test]
    fn labels_round_trip_for_every_variant() {
        for product in Product::ALL {
            assert_eq!(Product::from_label(product.label()), Some(product));
        }
    }

    #[test]
    fn wire_values_round_trip_for_every_variant() {
        for product in Product::ALL {
            assert_eq!(Product::from_wire(product.wire()), Ok(product));
        }
    }

    #[test]
    fn out_of_range_wire_value_is_rejected() {
        assert_eq!(Product::from_wire(8), Err(UnknownProduct(8)));
        assert_eq!(Product::from_wire(-1), Err(UnknownProduct(-1)));
    }

    #[test]
    fn roster_labels_match_the_published_choices() {
        assert_eq!(Product::TauOs.label(), "tauOS");
        assert_eq!(Product::Raboneko.label(), "Raboneko (me :3)");
        assert_eq!(Product::PhotonBrowser.label(), "photonBrowser");
    }
}
