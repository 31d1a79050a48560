//! Randomized check of incremental group maintenance against a from-scratch
//! recomputation after every mutation.

use grove_ecs::{EntityId, GroupId, Signature, World, WorldConfig};
use rand::{Rng, SeedableRng, rngs::StdRng};

#[derive(Debug, Clone, Copy, PartialEq)]
struct A(u32);

#[derive(Debug, Clone, Copy, PartialEq)]
struct B(u32);

#[derive(Debug, Clone, PartialEq)]
struct C(String);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Marked;

const ENTITIES: usize = 32;
const STEPS: usize = 4000;

fn has(world: &World, kind: usize, entity: EntityId) -> bool {
    match kind {
        0 => world.has_component::<A>(entity),
        1 => world.has_component::<B>(entity),
        2 => world.has_component::<C>(entity),
        _ => world.has_component::<Marked>(entity),
    }
}

fn toggle(world: &mut World, kind: usize, entity: EntityId) {
    let present = has(world, kind, entity);
    match (kind, present) {
        (0, false) => {
            world.create_component(entity, A(entity)).unwrap();
        }
        (0, true) => assert_eq!(world.remove_component::<A>(entity).unwrap(), A(entity)),
        (1, false) => {
            world.create_component(entity, B(entity)).unwrap();
        }
        (1, true) => assert_eq!(world.remove_component::<B>(entity).unwrap(), B(entity)),
        (2, false) => {
            world.create_component(entity, C(entity.to_string())).unwrap();
        }
        (2, true) => assert_eq!(
            world.remove_component::<C>(entity).unwrap(),
            C(entity.to_string())
        ),
        (_, false) => assert!(world.insert_tag::<Marked>(entity).unwrap()),
        (_, true) => assert!(world.remove_tag::<Marked>(entity).unwrap()),
    }
}

/// Included and excluded component kinds for each tested group.
fn shapes() -> Vec<(Vec<usize>, Vec<usize>)> {
    vec![
        (vec![0], vec![]),
        (vec![0, 1], vec![]),
        (vec![0], vec![1]),
        (vec![1, 2], vec![3]),
        (vec![3], vec![0, 2]),
        (vec![0, 1, 2, 3], vec![]),
    ]
}

fn signature(included: &[usize], excluded: &[usize]) -> Signature {
    let mut signature = Signature::new();
    for &kind in included {
        signature = match kind {
            0 => signature.include::<A>(),
            1 => signature.include::<B>(),
            2 => signature.include::<C>(),
            _ => signature.include::<Marked>(),
        };
    }
    for &kind in excluded {
        signature = match kind {
            0 => signature.exclude::<A>(),
            1 => signature.exclude::<B>(),
            2 => signature.exclude::<C>(),
            _ => signature.exclude::<Marked>(),
        };
    }
    signature
}

fn check(world: &World, groups: &[(GroupId, Vec<usize>, Vec<usize>)]) {
    for (id, included, excluded) in groups {
        let mut expected: Vec<EntityId> = world
            .entities()
            .iter()
            .filter(|&e| included.iter().all(|&k| has(world, k, e)))
            .filter(|&e| !excluded.iter().any(|&k| has(world, k, e)))
            .collect();
        expected.sort_unstable();

        let group = world.get_group(*id).unwrap();
        let mut actual = group.entities().to_vec();
        actual.sort_unstable();
        assert_eq!(actual, expected, "group {included:?} / {excluded:?}");

        for (index, &entity) in group.entities().iter().enumerate() {
            assert_eq!(group.index_of(entity), Some(index));
        }
    }

    // Dense and sparse sides of every store agree.
    for store in world.stores().iter() {
        for &entity in store.entities() {
            assert!(store.has(entity));
            assert!(world.is_alive(entity));
        }
    }
}

fn init_tracing() {
    // Set RUST_LOG=grove_ecs=trace to watch membership changes.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn run(seed: u64, build_groups_first: bool) {
    init_tracing();
    let config = WorldConfig::default()
        .with_max_entities(ENTITIES)
        .with_max_components(ENTITIES);
    let mut world = World::with_config(config).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut groups = Vec::new();
    let build = |world: &mut World| {
        shapes()
            .into_iter()
            .map(|(included, excluded)| {
                let id = world.group(signature(&included, &excluded)).unwrap();
                (id, included, excluded)
            })
            .collect::<Vec<_>>()
    };

    if build_groups_first {
        groups = build(&mut world);
    }

    for step in 0..STEPS {
        if !build_groups_first && step == STEPS / 4 {
            groups = build(&mut world);
            check(&world, &groups);
        }

        let alive: Vec<EntityId> = world.entities().iter().collect();
        let roll = rng.gen_range(0..100);

        if roll < 10 && alive.len() < ENTITIES {
            world.create_entity().unwrap();
        } else if roll < 15 && !alive.is_empty() {
            let entity = alive[rng.gen_range(0..alive.len())];
            world.destroy_entity(entity).unwrap();
        } else if !alive.is_empty() {
            let entity = alive[rng.gen_range(0..alive.len())];
            toggle(&mut world, rng.gen_range(0..4), entity);
        }

        check(&world, &groups);
    }
}

#[test]
fn test_groups_match_oracle_when_built_first() {
    for seed in 0..4 {
        run(seed, true);
    }
}

#[test]
fn test_groups_match_oracle_when_built_late() {
    for seed in 10..14 {
        run(seed, false);
    }
}
