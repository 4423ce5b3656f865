use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Element {
    #[default]
    None,
    Fire,
    Water,
    Wood,
    Earth,
    Metal,
    Holy,
    Demon,
}

impl Element {
    /// The element this one overcomes.
    ///
    /// The five phases form a cycle (FIRE > WOOD > EARTH > METAL > WATER > FIRE)
    /// while HOLY and DEMON overcome each other. `None` overcomes nothing.
    pub fn overcomes(self) -> Option<Element> {
        use Element::*;

        match self {
            Fire => Some(Wood),
            Wood => Some(Earth),
            Earth => Some(Metal),
            Metal => Some(Water),
            Water => Some(Fire),
            Holy => Some(Demon),
            Demon => Some(Holy),
            None => Option::None,
        }
    }

    /// True when an attack of this element has the advantage against `defender`.
    /// There is no "weak to" relation: losing the matchup is simply neutral.
    pub fn has_advantage_over(self, defender: Element) -> bool {
        defender != Element::None && self.overcomes() == Some(defender)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttackType {
    #[default]
    Physical,
    Magic,
}
