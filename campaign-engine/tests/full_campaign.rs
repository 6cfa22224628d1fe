use campaign_engine::{
    ArmyStack, Bonus, CampaignDefinition, CampaignError, CampaignGraph, CampaignHeader,
    CampaignState, HeroId, HeroInstance, Placement, PlayerColor, PrimarySkills, Scenario,
    ScenarioId, ScenarioStatus, deserialize, serialize,
};
use smallvec::smallvec;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const RED: PlayerColor = PlayerColor(0);

fn id(n: u8) -> ScenarioId {
    ScenarioId(n)
}

fn load_sample() -> Arc<CampaignDefinition> {
    Arc::new(
        CampaignDefinition::from_json(include_str!("../../assets/campaigns/sample.json")).unwrap(),
    )
}

fn sample_state() -> CampaignState {
    let definition = load_sample();
    let blobs = definition
        .graph()
        .iter()
        .map(|(id, scenario)| (id, scenario.map_name.as_bytes().to_vec()))
        .collect();
    CampaignState::new(definition, blobs).unwrap()
}

fn hero(n: u32, experience: u64) -> HeroInstance {
    HeroInstance {
        id: HeroId(n),
        owner: RED,
        name: format!("hero-{n}"),
        experience,
        ..HeroInstance::default()
    }
}

fn assert_round_trip(state: &CampaignState) {
    let bytes = serialize(state).unwrap();
    let restored = deserialize(&bytes).unwrap();
    assert_eq!(&restored, state);
}

fn minimal_pair() -> CampaignState {
    let graph = CampaignGraph::new([
        (id(0), Scenario::named("a")),
        (id(1), Scenario::named("b").requiring([id(0)])),
    ])
    .unwrap();
    let header = CampaignHeader {
        name: "pair".to_string(),
        ..CampaignHeader::default()
    };
    let definition = Arc::new(CampaignDefinition::new(header, graph));
    CampaignState::new(definition, BTreeMap::new()).unwrap()
}

#[test]
fn second_scenario_unlocks_after_first_is_conquered() {
    let mut state = minimal_pair();
    assert!(state.is_available(id(0)));
    assert!(!state.is_available(id(1)));

    state.set_current_map(id(0)).unwrap();
    state.set_current_map_as_conquered(&[]).unwrap();

    assert!(!state.is_available(id(0)));
    assert!(state.is_available(id(1)));
    assert!(!state.is_campaign_finished());

    state.set_current_map(id(1)).unwrap();
    state.set_current_map_as_conquered(&[]).unwrap();
    assert!(state.is_campaign_finished());
    assert_eq!(state.conquered_order(), &[id(0), id(1)]);
}

#[test]
fn conquering_with_nothing_in_progress_is_rejected() {
    let mut state = minimal_pair();
    state.set_current_map(id(0)).unwrap();
    state.set_current_map_as_conquered(&[]).unwrap();
    let conquered = state.conquered_scenarios();

    assert_eq!(
        state.set_current_map_as_conquered(&[hero(1, 0)]),
        Err(CampaignError::NoActiveScenario)
    );
    assert_eq!(state.conquered_scenarios(), conquered);
    assert!(state.crossover_heroes(id(1)).is_empty());
}

#[test]
fn mutually_dependent_scenarios_are_malformed() {
    let result = CampaignGraph::new([
        (id(0), Scenario::named("a").requiring([id(1)])),
        (id(1), Scenario::named("b").requiring([id(0)])),
    ]);
    assert!(matches!(result, Err(CampaignError::MalformedGraph { .. })));
}

#[test]
fn sample_campaign_plays_through_with_crossover() {
    let mut state = sample_state();
    assert_eq!(state.available_scenarios(), vec![id(0)]);
    assert_eq!(state.scenario_status(id(3)), ScenarioStatus::Locked);
    assert_eq!(state.map_data(id(3)), Some(&b"march_capital.map"[..]));

    // Watchford: fixed bonus, two heroes survive.
    state.set_current_map(id(0)).unwrap();
    assert_eq!(state.bonus(id(0)), Some(Bonus::Building { building: 7 }));
    let mut knight = hero(1, 1_000);
    knight.primary = PrimarySkills {
        attack: 2,
        defense: 1,
        ..PrimarySkills::default()
    };
    knight.artifacts = vec![12, 99];
    knight.army = smallvec![
        ArmyStack {
            creature: 3,
            count: 10
        },
        ArmyStack {
            creature: 7,
            count: 4
        },
    ];
    let ranger = hero(2, 400);
    state
        .set_current_map_as_conquered(&[knight.clone(), ranger])
        .unwrap();
    assert_eq!(state.available_scenarios(), vec![id(1), id(2)]);
    assert_round_trip(&state);

    // Northholt: artifacts were not kept out of Watchford, creatures are
    // filtered by Northholt's allow-list.
    state.set_current_map(id(1)).unwrap();
    assert_eq!(state.scenario_status(id(1)), ScenarioStatus::InProgress);
    state.set_current_map_bonus(1).unwrap();
    assert_eq!(
        state.bonus(id(1)),
        Some(Bonus::Artifact {
            hero: -1,
            artifact: 12
        })
    );
    let available = state.heroes_available_for(id(1));
    assert_eq!(available.len(), 2);
    assert_eq!(available[0].experience, Some(1_000));
    assert!(available[0].artifacts.is_empty());
    assert_eq!(
        available[0].army.as_slice(),
        &[ArmyStack {
            creature: 3,
            count: 10
        }]
    );
    state
        .place_heroes(
            id(1),
            &[Placement {
                hero: HeroId(1),
                placeholder: 0,
            }],
        )
        .unwrap();
    let lost: Vec<HeroId> = state
        .lost_crossover_heroes(id(1))
        .iter()
        .map(|h| h.id)
        .collect();
    assert_eq!(lost, vec![HeroId(2)]);

    let mut veteran = knight.clone();
    veteran.experience = 5_000;
    veteran.artifacts = vec![12, 44, 99];
    state.set_current_map_as_conquered(&[veteran]).unwrap();
    assert_round_trip(&state);

    // Silvervale: hero crossover start, no choosable bonus.
    state.set_current_map(id(2)).unwrap();
    assert_eq!(
        state.set_current_map_bonus(0),
        Err(CampaignError::InvalidBonusIndex {
            scenario: id(2),
            index: 0,
            available: 0,
        })
    );
    let mut returning = knight;
    returning.experience = 3_000;
    returning.artifacts = vec![44, 90];
    let mut scout = hero(3, 500);
    scout.primary.attack = 10;
    state
        .set_current_map_as_conquered(&[returning, scout])
        .unwrap();

    // The Old Capital merges both branches; the later conquest wins for a
    // hero that finished both.
    assert_eq!(state.available_scenarios(), vec![id(3)]);
    state.set_current_map(id(3)).unwrap();
    let available = state.heroes_available_for(id(3));
    let ids: Vec<HeroId> = available.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![HeroId(1), HeroId(3)]);
    assert_eq!(available[0].experience, Some(3_000));
    assert!(available[0].primary.is_none());
    assert_eq!(available[0].artifacts, vec![44, 90]);
    assert!(available[1].primary.is_none());

    let before = state.clone();
    assert_eq!(
        state.place_heroes(
            id(3),
            &[
                Placement {
                    hero: HeroId(3),
                    placeholder: 1,
                },
                Placement {
                    hero: HeroId(9),
                    placeholder: 2,
                },
            ],
        ),
        Err(CampaignError::HeroNotEligible {
            scenario: id(3),
            hero: HeroId(9),
        })
    );
    assert_eq!(state, before);

    state
        .place_heroes(
            id(3),
            &[
                Placement {
                    hero: HeroId(3),
                    placeholder: 1,
                },
                Placement {
                    hero: HeroId(1),
                    placeholder: 0,
                },
            ],
        )
        .unwrap();
    assert_eq!(
        state.place_heroes(
            id(3),
            &[Placement {
                hero: HeroId(1),
                placeholder: 2,
            }],
        ),
        Err(CampaignError::HeroAlreadyPlaced {
            scenario: id(3),
            hero: HeroId(1),
        })
    );
    assert!(state.lost_crossover_heroes(id(3)).is_empty());
    assert_eq!(state.strongest_hero(id(3), RED).unwrap().id, HeroId(1));
    assert!(state.strongest_hero(id(3), PlayerColor(1)).is_none());

    state.set_current_map_bonus(3).unwrap();
    assert_eq!(state.set_current_map_as_conquered(&[]), Ok(id(3)));
    assert!(state.is_campaign_finished());
    assert_eq!(state.last_scenario(), Some(id(3)));
    assert!(state.available_scenarios().is_empty());
    assert_round_trip(&state);
}

#[test]
fn lost_and_placed_partition_the_available_heroes() {
    let mut state = sample_state();
    state.set_current_map(id(0)).unwrap();
    let survivors: Vec<HeroInstance> = (1..=5).map(|n| hero(n, u64::from(n) * 100)).collect();
    state.set_current_map_as_conquered(&survivors).unwrap();

    state.set_current_map(id(2)).unwrap();
    state
        .place_heroes(
            id(2),
            &[
                Placement {
                    hero: HeroId(2),
                    placeholder: 0,
                },
                Placement {
                    hero: HeroId(5),
                    placeholder: 1,
                },
            ],
        )
        .unwrap();

    let available: BTreeSet<HeroId> = state
        .heroes_available_for(id(2))
        .iter()
        .map(|h| h.id)
        .collect();
    let placed: BTreeSet<HeroId> = state.placed_heroes(id(2)).iter().map(|p| p.hero.id).collect();
    let lost: BTreeSet<HeroId> = state
        .lost_crossover_heroes(id(2))
        .iter()
        .map(|h| h.id)
        .collect();

    assert!(placed.is_disjoint(&lost));
    assert_eq!(placed.union(&lost).copied().collect::<BTreeSet<_>>(), available);
    assert_eq!(available.len(), 5);
}

#[test]
fn heroes_with_nothing_kept_still_travel() {
    let graph = CampaignGraph::new([
        (id(0), Scenario::named("bare")),
        (id(1), Scenario::named("next").requiring([id(0)])),
    ])
    .unwrap();
    let definition = Arc::new(CampaignDefinition::new(CampaignHeader::default(), graph));
    let mut state = CampaignState::new(definition, BTreeMap::new()).unwrap();
    state.set_current_map(id(0)).unwrap();
    let mut survivor = hero(4, 9_000);
    survivor.spells = BTreeSet::from([1, 2]);
    survivor.artifacts = vec![5];
    state.set_current_map_as_conquered(&[survivor]).unwrap();

    let available = state.heroes_available_for(id(1));
    assert_eq!(available.len(), 1);
    assert!(available[0].is_empty_carryover());
    assert_eq!(available[0].name, "hero-4");
}

#[test]
fn restart_returns_to_the_initial_state() {
    let fresh = sample_state();
    let mut state = fresh.clone();
    state.set_current_map(id(0)).unwrap();
    state.set_current_map_as_conquered(&[hero(1, 10)]).unwrap();
    state.set_current_map(id(1)).unwrap();
    state.set_current_map_bonus(0).unwrap();

    state.restart();
    assert_eq!(state, fresh);
}
