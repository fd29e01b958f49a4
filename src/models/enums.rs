//! Enumerated tags carried on resource metadata.
//!
//! Wire tags are the store's uppercase, prefix-qualified strings
//! (e.g. `PROCESSING_STATE_COMPLETED`). Decoding is lenient: a tag this
//! build does not know collapses to the UNSPECIFIED variant rather than
//! failing the whole document.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ModelError;

/// Macro to generate a wire-tagged enum with as_str / from_wire / serde,
/// plus a display label with the enumeration prefix stripped.
macro_rules! wire_enum {
    ($name:ident, prefix = $prefix:literal, fallback = $fallback:ident {
        $($variant:ident => $s:literal),+ $(,)?
    }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub enum $name {
            #[default]
            $fallback,
            $($variant),+
        }

        impl $name {
            /// The store's wire tag for this variant.
            pub fn as_str(&self) -> &'static str {
                match self {
                    Self::$fallback => concat!($prefix, "UNSPECIFIED"),
                    $(Self::$variant => $s),+
                }
            }

            /// Lenient decode: unknown tags collapse to the fallback variant.
            pub fn from_wire(s: &str) -> Self {
                match s {
                    $($s => Self::$variant,)+
                    _ => Self::$fallback,
                }
            }

            /// Display label: wire tag with the enumeration prefix stripped
            /// and underscores replaced by spaces.
            pub fn label(&self) -> String {
                let tag = self.as_str();
                tag.strip_prefix($prefix).unwrap_or(tag).replace('_', " ")
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant),)+
                    tag if tag == Self::$fallback.as_str() => Ok(Self::$fallback),
                    _ => Err(ModelError::UnknownTag {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from_wire(&s))
            }
        }
    };
}

wire_enum!(ProcessingState, prefix = "PROCESSING_STATE_", fallback = Unspecified {
    NotStarted => "PROCESSING_STATE_NOT_STARTED",
    Processing => "PROCESSING_STATE_PROCESSING",
    Completed => "PROCESSING_STATE_COMPLETED",
    Failed => "PROCESSING_STATE_FAILED",
});

wire_enum!(ResourceVersion, prefix = "FHIR_VERSION_", fallback = Unspecified {
    R4 => "FHIR_VERSION_R4",
    R4B => "FHIR_VERSION_R4B",
});

/// Visual emphasis of the state badge in the table and detail panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeEmphasis {
    /// Positive/default styling (completed records).
    Default,
    /// Attention styling (in-flight or failed processing).
    Destructive,
    /// Neutral styling (nothing has happened yet).
    Secondary,
}

impl ProcessingState {
    /// Badge emphasis for this processing state.
    pub fn badge_emphasis(&self) -> BadgeEmphasis {
        match self {
            Self::Completed => BadgeEmphasis::Default,
            Self::Processing | Self::Failed => BadgeEmphasis::Destructive,
            Self::NotStarted | Self::Unspecified => BadgeEmphasis::Secondary,
        }
    }
}
