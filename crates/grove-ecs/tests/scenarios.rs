//! End-to-end behavior of a small world.

use grove_ecs::{EntityId, Error, Signature, World, WorldConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Health(u32);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Sleeping;

fn four_entity_world() -> (World, Vec<EntityId>) {
    let config = WorldConfig::default().with_max_entities(4);
    let mut world = World::with_config(config).unwrap();
    let entities = (0..4).map(|_| world.create_entity().unwrap()).collect();
    (world, entities)
}

fn populate(world: &mut World, e: &[EntityId]) {
    world.create_component(e[0], Position { x: 0.0, y: 0.0 }).unwrap();
    world.create_component(e[1], Position { x: 1.0, y: 1.0 }).unwrap();
    world.create_component(e[1], Velocity { x: 1.0, y: 0.0 }).unwrap();
    world.create_component(e[2], Velocity { x: 0.0, y: 1.0 }).unwrap();
}

fn sorted(entities: &[EntityId]) -> Vec<EntityId> {
    let mut entities = entities.to_vec();
    entities.sort_unstable();
    entities
}

#[test]
fn test_group_built_after_population() {
    let (mut world, e) = four_entity_world();
    populate(&mut world, &e);

    let group = world
        .group(Signature::new().include::<Position>().exclude::<Velocity>())
        .unwrap();
    assert_eq!(world.group_entities(group).unwrap(), &[e[0]]);
}

#[test]
fn test_group_built_before_population() {
    let (mut world, e) = four_entity_world();
    let group = world
        .group(Signature::new().include::<Position>().exclude::<Velocity>())
        .unwrap();
    populate(&mut world, &e);

    assert_eq!(world.group_entities(group).unwrap(), &[e[0]]);
}

#[test]
fn test_removing_excluded_component_admits_entity() {
    let (mut world, e) = four_entity_world();
    populate(&mut world, &e);
    let group = world
        .group(Signature::new().include::<Position>().exclude::<Velocity>())
        .unwrap();

    world.remove_component::<Velocity>(e[1]).unwrap();
    assert_eq!(sorted(world.group_entities(group).unwrap()), vec![e[0], e[1]]);
}

#[test]
fn test_recycling_order() {
    let (mut world, e) = four_entity_world();
    let target = e[2];
    let before = world.entities().generation(target).unwrap();

    world.destroy_entity(target).unwrap();
    let again = world.create_entity().unwrap();

    assert_eq!(again, target);
    assert_eq!(
        world.entities().generation(target).unwrap().get(),
        before.get() + 1
    );
}

#[test]
fn test_generation_safety() {
    let (mut world, e) = four_entity_world();
    let old = world.box_entity(e[3]).unwrap();

    world.destroy_entity(e[3]).unwrap();
    let reused = world.create_entity().unwrap();
    assert_eq!(reused, e[3]);
    assert_eq!(world.try_unbox(old), None);

    let fresh = world.box_entity(reused).unwrap();
    assert_eq!(world.try_unbox(fresh), Some(reused));
}

#[test]
fn test_signature_order_resolves_to_one_group() {
    let mut world = World::new();
    let a = world
        .group(
            Signature::new()
                .include::<Position>()
                .include::<Health>()
                .exclude::<Velocity>(),
        )
        .unwrap();
    let b = world
        .group(
            Signature::new()
                .exclude::<Velocity>()
                .include::<Health>()
                .include::<Position>(),
        )
        .unwrap();

    assert_eq!(a, b);
    assert_eq!(world.group_count(), 1);
}

#[test]
fn test_destroy_leaves_no_dangling_members() {
    let mut world = World::new();
    let all = world.group(Signature::new().include::<Health>()).unwrap();
    let awake = world
        .group(Signature::new().include::<Health>().exclude::<Sleeping>())
        .unwrap();

    let entities: Vec<EntityId> = (0..6).map(|i| world.spawn(Health(i)).unwrap()).collect();
    world.insert_tag::<Sleeping>(entities[1]).unwrap();
    world.insert_tag::<Sleeping>(entities[4]).unwrap();

    world.destroy_entity(entities[0]).unwrap();
    world.destroy_entity(entities[4]).unwrap();

    for store in world.stores().iter() {
        assert!(!store.has(entities[0]));
        assert!(!store.has(entities[4]));
        assert!(store.entities().iter().all(|&e| world.is_alive(e)));
    }
    assert_eq!(
        sorted(world.group_entities(all).unwrap()),
        vec![entities[1], entities[2], entities[3], entities[5]]
    );
    assert_eq!(
        sorted(world.group_entities(awake).unwrap()),
        vec![entities[2], entities[3], entities[5]]
    );
}

#[test]
fn test_precondition_errors_leave_state_intact() {
    let mut world = World::new();
    let entity = world.spawn(Health(5)).unwrap();
    let group = world.group(Signature::new().include::<Health>()).unwrap();

    assert!(matches!(
        world.create_component(entity, Health(9)),
        Err(Error::DuplicateComponent { .. })
    ));
    assert_eq!(world.get_component::<Health>(entity).unwrap(), &Health(5));
    assert_eq!(world.group_entities(group).unwrap(), &[entity]);

    assert!(matches!(
        world.remove_component::<Velocity>(entity),
        Err(Error::MissingComponent { .. })
    ));
    assert!(matches!(
        world.group(Signature::new().include::<Health>().exclude::<Health>()),
        Err(Error::ConflictingSignature { .. })
    ));
}

#[test]
fn test_component_capacity_is_reported() {
    let config = WorldConfig::default().with_max_components(2);
    let mut world = World::with_config(config).unwrap();
    world.spawn(Health(1)).unwrap();
    world.spawn(Health(2)).unwrap();

    let entity = world.create_entity().unwrap();
    let err = world.create_component(entity, Health(3)).map(|_| ()).unwrap_err();
    assert!(err.is_capacity());
    assert!(err.to_string().contains('2'));
}
