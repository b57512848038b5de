//! Small closed enumerations carried by database entities.
//!
//! Each enum has a one-byte wire tag and a canonical upper-case name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($variant:ident = $tag:literal => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum $name {
            $($variant = $tag,)+
        }

        impl $name {
            /// Every variant in tag order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// The wire tag.
            pub const fn tag(self) -> u8 {
                self as u8
            }

            /// Decode a wire tag.
            pub fn from_tag(tag: u8) -> Result<Self, TypeError> {
                match tag {
                    $($tag => Ok(Self::$variant),)+
                    _ => Err(TypeError::UnknownTag { kind: $label, tag }),
                }
            }

            /// Canonical upper-case name.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_uppercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(TypeError::UnknownName { kind: $label, name: s.to_string() }),
                }
            }
        }
    };
}

wire_enum! {
    /// Placement orientation of an instance.
    Orient, "orientation" {
        R0 = 0 => "R0",
        R90 = 1 => "R90",
        R180 = 2 => "R180",
        R270 = 3 => "R270",
        MY = 4 => "MY",
        MYR90 = 5 => "MYR90",
        MX = 6 => "MX",
        MXR90 = 7 => "MXR90",
    }
}

wire_enum! {
    /// How firmly an instance is bound to its location.
    PlacementStatus, "placement status" {
        None = 0 => "NONE",
        Unplaced = 1 => "UNPLACED",
        Suggested = 2 => "SUGGESTED",
        Placed = 3 => "PLACED",
        Locked = 4 => "LOCKED",
        Firm = 5 => "FIRM",
        Cover = 6 => "COVER",
    }
}

wire_enum! {
    /// Signal direction of a master terminal.
    IoType, "io type" {
        Input = 0 => "INPUT",
        Output = 1 => "OUTPUT",
        Inout = 2 => "INOUT",
        Feedthru = 3 => "FEEDTHRU",
    }
}

wire_enum! {
    /// Electrical role of a master terminal.
    SigType, "signal type" {
        Signal = 0 => "SIGNAL",
        Power = 1 => "POWER",
        Ground = 2 => "GROUND",
        Clock = 3 => "CLOCK",
        Analog = 4 => "ANALOG",
        Reset = 5 => "RESET",
        Scan = 6 => "SCAN",
        Tieoff = 7 => "TIEOFF",
    }
}

wire_enum! {
    /// Technology layer kind.
    LayerType, "layer type" {
        Routing = 0 => "ROUTING",
        Cut = 1 => "CUT",
        Masterslice = 2 => "MASTERSLICE",
        Overlap = 3 => "OVERLAP",
        Implant = 4 => "IMPLANT",
        None = 5 => "NONE",
    }
}

impl Default for Orient {
    fn default() -> Self {
        Self::R0
    }
}

impl Default for PlacementStatus {
    fn default() -> Self {
        Self::None
    }
}

impl PlacementStatus {
    /// Placed, locked, firm, and cover instances have a meaningful location.
    pub const fn is_placed(self) -> bool {
        matches!(self, Self::Placed | Self::Locked | Self::Firm | Self::Cover)
    }
}
