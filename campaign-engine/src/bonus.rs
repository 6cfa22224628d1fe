//! Starting bonuses and the per-scenario catalog of choosable bonuses.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CampaignError;
use crate::graph::CampaignGraph;
use crate::ids::ScenarioId;

/// A starting advantage granted when a scenario begins.
///
/// Every variant maps onto a numeric kind code plus three integer
/// parameters, which is how bonuses are laid out in save data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Bonus {
    Spell {
        hero: i32,
        spell: i32,
    },
    Monster {
        hero: i32,
        creature: i32,
        amount: i32,
    },
    Building {
        building: i32,
    },
    Artifact {
        hero: i32,
        artifact: i32,
    },
    SpellScroll {
        hero: i32,
        spell: i32,
    },
    /// `packed` holds attack, defense, spell power and knowledge gains as
    /// the four little-endian bytes of the integer.
    PrimarySkill {
        hero: i32,
        packed: i32,
    },
    SecondarySkill {
        hero: i32,
        skill: i32,
        mastery: i32,
    },
    Resource {
        resource: i32,
        amount: i32,
    },
    HeroesFromPreviousScenario {
        player: i32,
        scenario: i32,
    },
    Hero {
        player: i32,
        hero: i32,
    },
}

impl Bonus {
    pub const KIND_COUNT: u8 = 10;

    /// Stable numeric code of the bonus kind.
    #[must_use]
    pub const fn kind_code(&self) -> u8 {
        match self {
            Self::Spell { .. } => 0,
            Self::Monster { .. } => 1,
            Self::Building { .. } => 2,
            Self::Artifact { .. } => 3,
            Self::SpellScroll { .. } => 4,
            Self::PrimarySkill { .. } => 5,
            Self::SecondarySkill { .. } => 6,
            Self::Resource { .. } => 7,
            Self::HeroesFromPreviousScenario { .. } => 8,
            Self::Hero { .. } => 9,
        }
    }

    #[must_use]
    pub const fn params(&self) -> [i32; 3] {
        match *self {
            Self::Spell { hero, spell } | Self::SpellScroll { hero, spell } => [hero, spell, 0],
            Self::Monster {
                hero,
                creature,
                amount,
            } => [hero, creature, amount],
            Self::Building { building } => [building, 0, 0],
            Self::Artifact { hero, artifact } => [hero, artifact, 0],
            Self::PrimarySkill { hero, packed } => [hero, packed, 0],
            Self::SecondarySkill {
                hero,
                skill,
                mastery,
            } => [hero, skill, mastery],
            Self::Resource { resource, amount } => [resource, amount, 0],
            Self::HeroesFromPreviousScenario { player, scenario } => [player, scenario, 0],
            Self::Hero { player, hero } => [player, hero, 0],
        }
    }

    /// Rebuild a bonus from its kind code and parameter triple.
    #[must_use]
    pub const fn from_parts(kind: u8, [a, b, c]: [i32; 3]) -> Option<Self> {
        let bonus = match kind {
            0 => Self::Spell { hero: a, spell: b },
            1 => Self::Monster {
                hero: a,
                creature: b,
                amount: c,
            },
            2 => Self::Building { building: a },
            3 => Self::Artifact {
                hero: a,
                artifact: b,
            },
            4 => Self::SpellScroll { hero: a, spell: b },
            5 => Self::PrimarySkill { hero: a, packed: b },
            6 => Self::SecondarySkill {
                hero: a,
                skill: b,
                mastery: c,
            },
            7 => Self::Resource {
                resource: a,
                amount: b,
            },
            8 => Self::HeroesFromPreviousScenario {
                player: a,
                scenario: b,
            },
            9 => Self::Hero {
                player: a,
                hero: b,
            },
            _ => return None,
        };
        Some(bonus)
    }

    /// True when applying the bonus needs a target hero in context.
    #[must_use]
    pub const fn is_for_hero(&self) -> bool {
        matches!(
            self,
            Self::Spell { .. }
                | Self::Monster { .. }
                | Self::Artifact { .. }
                | Self::SpellScroll { .. }
                | Self::PrimarySkill { .. }
                | Self::SecondarySkill { .. }
        )
    }

    /// Attack, defense, spell power and knowledge gains of a primary skill bonus.
    #[must_use]
    pub const fn primary_gains(&self) -> Option<[u8; 4]> {
        match *self {
            Self::PrimarySkill { packed, .. } => Some(packed.to_le_bytes()),
            _ => None,
        }
    }
}

/// How a scenario's starting conditions are decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StartMode {
    #[default]
    None,
    FixedBonus,
    ChooseBonus,
    HeroCrossover,
}

impl StartMode {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::FixedBonus => 1,
            Self::ChooseBonus => 2,
            Self::HeroCrossover => 3,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::FixedBonus),
            2 => Some(Self::ChooseBonus),
            3 => Some(Self::HeroCrossover),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ScenarioBonuses {
    mode: StartMode,
    offered: Vec<Bonus>,
}

/// Read-only lookup of the bonuses each scenario offers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BonusCatalog {
    entries: BTreeMap<ScenarioId, ScenarioBonuses>,
}

impl BonusCatalog {
    #[must_use]
    pub fn from_graph(graph: &CampaignGraph) -> Self {
        let entries = graph
            .iter()
            .map(|(id, scenario)| {
                (
                    id,
                    ScenarioBonuses {
                        mode: scenario.travel.start_mode,
                        offered: scenario.travel.bonuses.clone(),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Ordered list of bonuses listed for a scenario.
    #[must_use]
    pub fn bonuses_for(&self, scenario: ScenarioId) -> &[Bonus] {
        self.entries
            .get(&scenario)
            .map_or(&[], |entry| entry.offered.as_slice())
    }

    /// Bonuses the player may pick from; empty unless the scenario lets the
    /// player choose.
    #[must_use]
    pub fn choosable(&self, scenario: ScenarioId) -> &[Bonus] {
        match self.entries.get(&scenario) {
            Some(entry) if entry.mode == StartMode::ChooseBonus => &entry.offered,
            _ => &[],
        }
    }

    #[must_use]
    pub fn start_mode(&self, scenario: ScenarioId) -> StartMode {
        self.entries
            .get(&scenario)
            .map_or(StartMode::None, |entry| entry.mode)
    }

    /// Resolve a player's choice to the bonus value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBonusIndex` when `index` is outside the choosable list.
    pub fn resolve(&self, scenario: ScenarioId, index: u8) -> Result<Bonus, CampaignError> {
        let choosable = self.choosable(scenario);
        choosable
            .get(usize::from(index))
            .copied()
            .ok_or(CampaignError::InvalidBonusIndex {
                scenario,
                index,
                available: choosable.len(),
            })
    }

    #[must_use]
    pub const fn is_bonus_for_hero(bonus: &Bonus) -> bool {
        bonus.is_for_hero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Scenario, TravelRules};

    fn catalog() -> BonusCatalog {
        let mut choose = Scenario::named("choose");
        choose.travel = TravelRules {
            start_mode: StartMode::ChooseBonus,
            bonuses: vec![
                Bonus::Resource {
                    resource: 6,
                    amount: 2_000,
                },
                Bonus::Spell { hero: 3, spell: 15 },
            ],
            ..TravelRules::default()
        };
        let mut fixed = Scenario::named("fixed");
        fixed.travel.start_mode = StartMode::FixedBonus;
        fixed.travel.bonuses = vec![Bonus::Building { building: 7 }];
        let graph = CampaignGraph::new([(ScenarioId(0), choose), (ScenarioId(1), fixed)]).unwrap();
        BonusCatalog::from_graph(&graph)
    }

    #[test]
    fn resolve_checks_choosable_range() {
        let catalog = catalog();
        assert_eq!(
            catalog.resolve(ScenarioId(0), 1).unwrap(),
            Bonus::Spell { hero: 3, spell: 15 }
        );
        assert_eq!(
            catalog.resolve(ScenarioId(0), 2),
            Err(CampaignError::InvalidBonusIndex {
                scenario: ScenarioId(0),
                index: 2,
                available: 2
            })
        );
    }

    #[test]
    fn fixed_bonuses_are_listed_but_not_choosable() {
        let catalog = catalog();
        assert_eq!(catalog.bonuses_for(ScenarioId(1)).len(), 1);
        assert!(catalog.choosable(ScenarioId(1)).is_empty());
        assert!(catalog.resolve(ScenarioId(1), 0).is_err());
        assert!(catalog.bonuses_for(ScenarioId(9)).is_empty());
        assert_eq!(catalog.start_mode(ScenarioId(9)), StartMode::None);
    }

    #[test]
    fn hero_targeting_follows_kind() {
        assert!(BonusCatalog::is_bonus_for_hero(&Bonus::Artifact {
            hero: 1,
            artifact: 4
        }));
        assert!(!BonusCatalog::is_bonus_for_hero(&Bonus::Resource {
            resource: 0,
            amount: 10
        }));
        assert!(!Bonus::Hero { player: 0, hero: 2 }.is_for_hero());
    }

    #[test]
    fn parts_rebuild_every_kind() {
        for kind in 0..Bonus::KIND_COUNT {
            let bonus = Bonus::from_parts(kind, [1, 2, 3]).unwrap();
            assert_eq!(bonus.kind_code(), kind);
            assert_eq!(Bonus::from_parts(kind, bonus.params()), Some(bonus));
        }
        assert!(Bonus::from_parts(Bonus::KIND_COUNT, [0, 0, 0]).is_none());
    }

    #[test]
    fn primary_gains_unpack_bytes() {
        let bonus = Bonus::PrimarySkill {
            hero: 0,
            packed: i32::from_le_bytes([2, 1, 0, 3]),
        };
        assert_eq!(bonus.primary_gains(), Some([2, 1, 0, 3]));
        assert_eq!(Bonus::Building { building: 1 }.primary_gains(), None);
    }

    #[test]
    fn bonus_json_uses_kind_tag() {
        let bonus: Bonus =
            serde_json::from_str(r#"{"kind":"monster","hero":1,"creature":12,"amount":20}"#)
                .unwrap();
        assert_eq!(
            bonus,
            Bonus::Monster {
                hero: 1,
                creature: 12,
                amount: 20
            }
        );
    }
}
