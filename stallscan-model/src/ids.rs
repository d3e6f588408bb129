use std::fmt;

use crate::error::ModelError;

/// Opaque token read from a physical marker.
///
/// Unique within an event's marker namespace, not globally. Surrounding
/// whitespace from the detector is trimmed on construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct MarkerId(String);

impl MarkerId {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ModelError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ModelError::EmptyIdentifier("marker id"));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MarkerId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MarkerId> for String {
    fn from(value: MarkerId) -> Self {
        value.0
    }
}

impl std::str::FromStr for MarkerId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for MarkerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! document_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(
            feature = "serde",
            derive(serde::Serialize, serde::Deserialize)
        )]
        #[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Result<Self, ModelError> {
                let raw = raw.into();
                if raw.trim().is_empty() {
                    return Err(ModelError::EmptyIdentifier($label));
                }
                Ok(Self(raw))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ModelError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

document_id!(
    /// Document id of a stall record.
    StallId,
    "stall id"
);

document_id!(
    /// Document id of an event record.
    EventId,
    "event id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_id_trims_detector_noise() {
        let id = MarkerId::new("  STALL_001\n").unwrap();
        assert_eq!(id.as_str(), "STALL_001");
    }

    #[test]
    fn blank_identifiers_are_rejected() {
        assert_eq!(
            MarkerId::new("   "),
            Err(ModelError::EmptyIdentifier("marker id"))
        );
        assert!(EventId::new("").is_err());
        assert!("".parse::<StallId>().is_err());
    }

    #[test]
    fn event_ids_compare_by_value() {
        let a: EventId = "E1".parse().unwrap();
        let b = EventId::new(String::from("E1")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "E1");
    }
}
