//! Strongly typed string identifiers.
//!
//! The engine names every object with a string.  Wrapping each kind in its own
//! newtype keeps a lane id from being passed where an edge id is expected.
//! All ids are `Ord + Hash` so they work as keys in sorted and hashed maps.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Generate a typed id wrapper around an owned `String`.
macro_rules! string_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
        #[serde(transparent)]
        $vis struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// A vehicle known to the engine.
    pub struct VehicleId;
}

string_id! {
    /// A named route (ordered edge list) known to the engine.
    pub struct RouteId;
}

string_id! {
    /// Engine-native traffic-light id.  Commands address lights by their
    /// sequential alias (`tl_0`, `tl_1`, …) instead.
    pub struct LightId;
}

string_id! {
    /// A directed road edge.
    pub struct EdgeId;
}

string_id! {
    /// A single lane of an edge.
    pub struct LaneId;
}

string_id! {
    /// A parking area or charging station.
    pub struct StationId;
}

string_id! {
    /// A static map polygon (buildings, parks, water).
    pub struct PolygonId;
}

impl EdgeId {
    /// Internal junction edges are prefixed with `:` and are not valid route
    /// endpoints.
    #[inline]
    pub fn is_internal(&self) -> bool {
        self.0.starts_with(':')
    }
}

impl RouteId {
    /// Deterministic id for a route computed between two edges.
    pub fn between(start: &EdgeId, end: &EdgeId) -> Self {
        Self(format!("route_{start}to{end}"))
    }
}
