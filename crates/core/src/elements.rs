//! Player element capabilities and per-enemy element requirements.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Element {
    Heat,
    Cold,
    Shock,
    Wave,
}

impl Element {
    pub const ALL: [Element; 4] = [Element::Heat, Element::Cold, Element::Shock, Element::Wave];

    pub fn name(self) -> &'static str {
        match self {
            Self::Heat => "heat",
            Self::Cold => "cold",
            Self::Shock => "shock",
            Self::Wave => "wave",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown element `{0}` (expected heat, cold, shock, wave, all or none)")]
pub struct ParseElementError(pub String);

impl FromStr for Element {
    type Err = ParseElementError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "heat" => Ok(Self::Heat),
            "cold" => Ok(Self::Cold),
            "shock" => Ok(Self::Shock),
            "wave" => Ok(Self::Wave),
            other => Err(ParseElementError(other.to_string())),
        }
    }
}

/// Which elements the player can currently use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementFlags {
    pub heat: bool,
    pub cold: bool,
    pub shock: bool,
    pub wave: bool,
}

impl ElementFlags {
    pub const NONE: Self = Self { heat: false, cold: false, shock: false, wave: false };
    pub const ALL: Self = Self { heat: true, cold: true, shock: true, wave: true };

    /// Capabilities as the game reports them: without the element-change
    /// core no element is usable, whatever else is unlocked.
    pub fn from_player_cores(element_change: bool, heat: bool, cold: bool, shock: bool, wave: bool) -> Self {
        if !element_change {
            return Self::NONE;
        }
        Self { heat, cold, shock, wave }
    }

    pub fn has(self, element: Element) -> bool {
        match element {
            Element::Heat => self.heat,
            Element::Cold => self.cold,
            Element::Shock => self.shock,
            Element::Wave => self.wave,
        }
    }

    pub fn with(mut self, element: Element) -> Self {
        match element {
            Element::Heat => self.heat = true,
            Element::Cold => self.cold = true,
            Element::Shock => self.shock = true,
            Element::Wave => self.wave = true,
        }
        self
    }

    pub fn any(self) -> bool {
        self.heat || self.cold || self.shock || self.wave
    }

    /// True when every element flagged in `required` is also flagged here.
    pub fn covers(self, required: ElementFlags) -> bool {
        Element::ALL.iter().all(|&element| !required.has(element) || self.has(element))
    }
}

/// Parses `heat,cold`, `all` or `none`.
impl FromStr for ElementFlags {
    type Err = ParseElementError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "none" => return Ok(Self::NONE),
            "all" => return Ok(Self::ALL),
            _ => {}
        }
        raw.split(',')
            .try_fold(Self::NONE, |flags, part| part.parse::<Element>().map(|element| flags.with(element)))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ElementTupleError {
    #[error("heat slot must be -1, 0 or 1, got {0}")]
    Heat(i8),
    #[error("{element} slot must be 0 or 1, got {value}")]
    Flag { element: Element, value: i8 },
}

/// What an enemy demands of the player's elements before it may be placed.
///
/// Stored in data files as a `[heat, cold, shock, wave]` tuple. A heat value
/// of `-1` turns the whole tuple into an any-of requirement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[i8; 4]", into = "[i8; 4]")]
pub struct ElementRequirement {
    pub any_of: bool,
    pub required: ElementFlags,
}

impl ElementRequirement {
    pub const NONE: Self = Self { any_of: false, required: ElementFlags::NONE };
    pub const ANY: Self = Self { any_of: true, required: ElementFlags::NONE };

    pub fn all_of(required: ElementFlags) -> Self {
        Self { any_of: false, required }
    }

    /// An any-of requirement accepts a player holding at least one element;
    /// otherwise every required element must be available.
    pub fn is_satisfied_by(&self, available: ElementFlags) -> bool {
        if self.any_of {
            return available.any();
        }
        available.covers(self.required)
    }
}

impl TryFrom<[i8; 4]> for ElementRequirement {
    type Error = ElementTupleError;

    fn try_from([heat, cold, shock, wave]: [i8; 4]) -> Result<Self, Self::Error> {
        let flag = |element: Element, value: i8| match value {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(ElementTupleError::Flag { element, value }),
        };
        let (any_of, heat) = match heat {
            -1 => (true, false),
            0 => (false, false),
            1 => (false, true),
            other => return Err(ElementTupleError::Heat(other)),
        };
        Ok(Self {
            any_of,
            required: ElementFlags {
                heat,
                cold: flag(Element::Cold, cold)?,
                shock: flag(Element::Shock, shock)?,
                wave: flag(Element::Wave, wave)?,
            },
        })
    }
}

impl From<ElementRequirement> for [i8; 4] {
    fn from(requirement: ElementRequirement) -> Self {
        let heat = if requirement.any_of { -1 } else { i8::from(requirement.required.heat) };
        [
            heat,
            i8::from(requirement.required.cold),
            i8::from(requirement.required.shock),
            i8::from(requirement.required.wave),
        ]
    }
}
