//! Groups - incrementally maintained caches of entities matching a
//! [`Signature`].
//!
//! A group is seeded once from the smallest included store and from then on
//! only reacts to store notifications:
//!
//! | store role | created       | removed       |
//! |------------|---------------|---------------|
//! | included   | `try_include` | `try_exclude` |
//! | excluded   | `try_exclude` | `try_include` |
//!
//! Equivalent signatures share one group through the [`GroupRegistry`].

use std::fmt;

use tracing::{debug, trace, warn};

use crate::{
    component::ComponentId,
    entity::{EntityId, Generation},
    error::{Error, Result},
    observer::{Reaction, StoreEvent, Subscription},
    signature::Signature,
    sparse_set::SparseSet,
    storage::AnyStore,
    stores::StoreRegistry,
};

/// Generational handle to a group in a [`GroupRegistry`].
///
/// A removed group's slot may be reused; the bumped generation keeps the old
/// id from resolving to the new group.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId {
    index: u32,
    generation: Generation,
}

impl GroupId {
    /// Slot index in the registry.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[must_use]
    pub const fn generation(self) -> Generation {
        self.generation
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({}v{})", self.index, self.generation.get())
    }
}

/// Live set of entities present in every included store and absent from
/// every excluded store.
pub struct Group {
    signature: Signature,
    members: SparseSet,
}

impl Group {
    /// Build a group and seed it from the current store contents.
    ///
    /// The scan walks the smallest included store. A missing included store
    /// means nothing can match yet.
    fn build(signature: Signature, max_entities: usize, stores: &StoreRegistry) -> Self {
        let seed = smallest_included(&signature, stores);
        let mut group = Self {
            signature,
            members: SparseSet::new(max_entities, max_entities),
        };
        if let Some(store) = seed {
            for &entity in store.entities() {
                group.try_include(entity, stores);
            }
        }
        group
    }

    /// Check an entity against the signature from scratch.
    #[must_use]
    pub fn matches_entity(&self, entity: EntityId, stores: &StoreRegistry) -> bool {
        self.signature
            .included()
            .iter()
            .all(|&id| stores.has(id, entity))
            && !self
                .signature
                .excluded()
                .iter()
                .any(|&id| stores.has(id, entity))
    }

    /// Add the entity if it matches. Members are never added twice.
    fn try_include(&mut self, entity: EntityId, stores: &StoreRegistry) {
        if self.members.contains(entity) || !self.matches_entity(entity, stores) {
            return;
        }
        match self.members.insert(entity) {
            Ok(_) => trace!(entity, "group member added"),
            Err(error) => warn!(entity, %error, "group member rejected"),
        }
    }

    /// Drop the entity if it is a member.
    fn try_exclude(&mut self, entity: EntityId) {
        if self.members.remove(entity).is_ok() {
            trace!(entity, "group member removed");
        }
    }

    fn react(&mut self, reaction: Reaction, entity: EntityId, stores: &StoreRegistry) {
        match reaction {
            Reaction::TryInclude => self.try_include(entity, stores),
            Reaction::TryExclude => self.try_exclude(entity),
        }
    }

    /// Current members, in dense order.
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        self.members.entries()
    }

    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.members.contains(entity)
    }

    /// Dense position of a member.
    #[must_use]
    pub fn index_of(&self, entity: EntityId) -> Option<usize> {
        self.members.index_of(entity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// The smallest included store, or `None` when any included store does not
/// exist yet.
fn smallest_included<'a>(
    signature: &Signature,
    stores: &'a StoreRegistry,
) -> Option<&'a dyn AnyStore> {
    let mut smallest: Option<&dyn AnyStore> = None;
    for &id in signature.included() {
        let store = stores.get_dyn(id)?;
        if smallest.is_none_or(|best| store.len() < best.len()) {
            smallest = Some(store);
        }
    }
    smallest
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("signature", &self.signature)
            .field("len", &self.members.len())
            .finish()
    }
}

struct GroupSlot {
    generation: Generation,
    group: Option<Group>,
}

/// Owns every live group and deduplicates them by signature.
pub struct GroupRegistry {
    slots: Vec<GroupSlot>,
    free: Vec<u32>,
    len: usize,
    max_groups: usize,
    max_entities: usize,
}

impl GroupRegistry {
    #[must_use]
    pub fn new(max_groups: usize, max_entities: usize) -> Self {
        Self {
            slots: Vec::with_capacity(max_groups),
            free: Vec::new(),
            len: 0,
            max_groups,
            max_entities,
        }
    }

    /// Fetch the group for `signature`, building it on a true miss.
    ///
    /// A new group is seeded from the stores and subscribed to every store
    /// its signature names that already exists. Stores created later are
    /// wired up through [`Self::attach`].
    pub fn get_or_build(
        &mut self,
        signature: Signature,
        stores: &mut StoreRegistry,
    ) -> Result<GroupId> {
        signature.validate()?;
        if let Some(id) = self.find(&signature) {
            trace!(group = ?id, "group cache hit");
            return Ok(id);
        }
        if self.len >= self.max_groups {
            return Err(Error::GroupCapacity {
                capacity: self.max_groups,
            });
        }

        let group = Group::build(signature, self.max_entities, stores);
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(GroupSlot {
                    generation: Generation::new(),
                    group: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        let id = GroupId {
            index,
            generation: slot.generation,
        };

        for (component, role) in group.signature().terms() {
            if let Some(store) = stores.get_dyn_mut(component) {
                store.observers_mut().subscribe(Subscription { group: id, role });
            }
        }

        debug!(
            group = ?id,
            signature = ?group.signature(),
            seeded = group.len(),
            "group built"
        );
        slot.group = Some(group);
        self.len += 1;
        Ok(id)
    }

    /// Look up a live group with an equal signature.
    #[must_use]
    pub fn find(&self, signature: &Signature) -> Option<GroupId> {
        self.iter()
            .find(|(_, group)| group.signature().matches(signature))
            .map(|(id, _)| id)
    }

    /// Resolve a group id; stale ids resolve to `None`.
    #[must_use]
    pub fn get(&self, id: GroupId) -> Option<&Group> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?
            .group
            .as_ref()
    }

    fn get_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?
            .group
            .as_mut()
    }

    /// Tear a group down: unsubscribe from every watched store and free its
    /// slot.
    pub fn remove(&mut self, id: GroupId, stores: &mut StoreRegistry) -> Result<Group> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .ok_or(Error::UnknownGroup)?;
        let group = slot.group.take().ok_or(Error::UnknownGroup)?;
        slot.generation = slot.generation.next();

        for (component, role) in group.signature().terms() {
            if let Some(store) = stores.get_dyn_mut(component) {
                store
                    .observers_mut()
                    .unsubscribe(&Subscription { group: id, role });
            }
        }

        self.free.push(id.index);
        self.len -= 1;
        debug!(group = ?id, "group removed");
        Ok(group)
    }

    /// Remove every group.
    pub fn clear(&mut self, stores: &mut StoreRegistry) {
        let ids: Vec<GroupId> = self.iter().map(|(id, _)| id).collect();
        for id in ids {
            if let Err(error) = self.remove(id, stores) {
                warn!(group = ?id, %error, "live group failed to clear");
            }
        }
    }

    /// Deliver one store event to one subscribed group.
    pub fn dispatch(
        &mut self,
        subscription: Subscription,
        event: StoreEvent,
        entity: EntityId,
        stores: &StoreRegistry,
    ) {
        let Some(group) = self.get_mut(subscription.group) else {
            warn!(group = ?subscription.group, "event for unknown group dropped");
            return;
        };
        group.react(subscription.role.reaction(event), entity, stores);
    }

    /// Deliver a store event to every group watching `component`, in
    /// subscription order.
    pub fn notify(
        &mut self,
        stores: &StoreRegistry,
        component: ComponentId,
        event: StoreEvent,
        entity: EntityId,
    ) {
        let Some(store) = stores.get_dyn(component) else {
            return;
        };
        for &subscription in store.observers().as_slice() {
            self.dispatch(subscription, event, entity, stores);
        }
    }

    /// Subscribe existing groups to a newly created store.
    pub fn attach(&self, component: ComponentId, stores: &mut StoreRegistry) {
        let Some(store) = stores.get_dyn_mut(component) else {
            return;
        };
        for (id, group) in self.iter() {
            if let Some(role) = group.signature().role_of(component) {
                store.observers_mut().subscribe(Subscription { group: id, role });
            }
        }
    }

    /// Iterate live groups in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &Group)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let group = slot.group.as_ref()?;
            let id = GroupId {
                index: index as u32,
                generation: slot.generation,
            };
            Some((id, group))
        })
    }

    /// Number of live groups.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub const fn max_groups(&self) -> usize {
        self.max_groups
    }
}

impl fmt::Debug for GroupRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupRegistry")
            .field("len", &self.len)
            .field("max_groups", &self.max_groups)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position;
    struct Velocity;
    struct Health;

    fn stores() -> StoreRegistry {
        let mut stores = StoreRegistry::new(8, 16, 16);
        stores.ensure::<Position>().unwrap();
        stores.ensure::<Velocity>().unwrap();
        stores
    }

    /// Create a component and notify, the way the world does.
    fn add<T: crate::Component>(
        groups: &mut GroupRegistry,
        stores: &mut StoreRegistry,
        entity: EntityId,
        value: T,
    ) {
        stores.get_mut::<T>().unwrap().create(entity, value).unwrap();
        groups.notify(stores, ComponentId::of::<T>(), StoreEvent::Created, entity);
    }

    fn remove<T: crate::Component>(
        groups: &mut GroupRegistry,
        stores: &mut StoreRegistry,
        entity: EntityId,
    ) {
        stores.get_mut::<T>().unwrap().remove(entity).unwrap();
        groups.notify(stores, ComponentId::of::<T>(), StoreEvent::Removed, entity);
    }

    #[test]
    fn test_seed_from_existing_components() {
        let mut stores = stores();
        let mut groups = GroupRegistry::new(4, 16);
        add(&mut groups, &mut stores, 0, Position);
        add(&mut groups, &mut stores, 1, Position);
        add(&mut groups, &mut stores, 1, Velocity);

        let id = groups
            .get_or_build(
                Signature::new().include::<Position>().exclude::<Velocity>(),
                &mut stores,
            )
            .unwrap();
        assert_eq!(groups.get(id).unwrap().entities(), &[0]);
    }

    #[test]
    fn test_incremental_updates() {
        let mut stores = stores();
        let mut groups = GroupRegistry::new(4, 16);
        let id = groups
            .get_or_build(
                Signature::new().include::<Position>().exclude::<Velocity>(),
                &mut stores,
            )
            .unwrap();

        add(&mut groups, &mut stores, 3, Position);
        assert!(groups.get(id).unwrap().contains(3));

        add(&mut groups, &mut stores, 3, Velocity);
        assert!(!groups.get(id).unwrap().contains(3));

        remove::<Velocity>(&mut groups, &mut stores, 3);
        assert!(groups.get(id).unwrap().contains(3));

        remove::<Position>(&mut groups, &mut stores, 3);
        assert!(groups.get(id).unwrap().is_empty());
    }

    #[test]
    fn test_no_double_add() {
        let mut stores = stores();
        let mut groups = GroupRegistry::new(4, 16);
        let id = groups
            .get_or_build(
                Signature::new().include::<Position>().include::<Velocity>(),
                &mut stores,
            )
            .unwrap();

        add(&mut groups, &mut stores, 5, Position);
        add(&mut groups, &mut stores, 5, Velocity);
        let group = groups.get(id).unwrap();
        assert_eq!(group.entities(), &[5]);

        // A stray include event for a member must not duplicate it.
        groups.notify(&stores, ComponentId::of::<Position>(), StoreEvent::Created, 5);
        assert_eq!(groups.get(id).unwrap().len(), 1);
    }

    #[test]
    fn test_dedup_by_signature() {
        let mut stores = stores();
        let mut groups = GroupRegistry::new(4, 16);
        let a = groups
            .get_or_build(
                Signature::new().include::<Position>().exclude::<Velocity>(),
                &mut stores,
            )
            .unwrap();
        let b = groups
            .get_or_build(
                Signature::new().exclude::<Velocity>().include::<Position>(),
                &mut stores,
            )
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(groups.len(), 1);
        // One subscription per watched store, not one per request.
        assert_eq!(
            stores.get::<Position>().unwrap().observers().len(),
            1
        );
    }

    #[test]
    fn test_group_capacity() {
        let mut stores = stores();
        let mut groups = GroupRegistry::new(1, 16);
        groups
            .get_or_build(Signature::new().include::<Position>(), &mut stores)
            .unwrap();

        assert_eq!(
            groups.get_or_build(Signature::new().include::<Velocity>(), &mut stores),
            Err(Error::GroupCapacity { capacity: 1 })
        );
    }

    #[test]
    fn test_invalid_signatures_are_rejected() {
        let mut stores = stores();
        let mut groups = GroupRegistry::new(4, 16);

        assert_eq!(
            groups.get_or_build(Signature::new(), &mut stores),
            Err(Error::EmptySignature)
        );
        assert!(matches!(
            groups.get_or_build(
                Signature::new().include::<Position>().exclude::<Position>(),
                &mut stores
            ),
            Err(Error::ConflictingSignature { .. })
        ));
        assert!(groups.is_empty());
    }

    #[test]
    fn test_remove_unsubscribes_and_invalidates_id() {
        let mut stores = stores();
        let mut groups = GroupRegistry::new(4, 16);
        let old = groups
            .get_or_build(
                Signature::new().include::<Position>().exclude::<Velocity>(),
                &mut stores,
            )
            .unwrap();

        groups.remove(old, &mut stores).unwrap();
        assert!(groups.get(old).is_none());
        assert!(stores.get::<Position>().unwrap().observers().is_empty());
        assert!(stores.get::<Velocity>().unwrap().observers().is_empty());
        assert_eq!(groups.remove(old, &mut stores).unwrap_err(), Error::UnknownGroup);

        let new = groups
            .get_or_build(Signature::new().include::<Velocity>(), &mut stores)
            .unwrap();
        assert_eq!(new.index(), old.index());
        assert_ne!(new, old);
        assert!(groups.get(old).is_none());
    }

    #[test]
    fn test_missing_store_attaches_later() {
        let mut stores = stores();
        let mut groups = GroupRegistry::new(4, 16);
        add(&mut groups, &mut stores, 2, Position);

        let with = groups
            .get_or_build(
                Signature::new().include::<Position>().include::<Health>(),
                &mut stores,
            )
            .unwrap();
        let without = groups
            .get_or_build(
                Signature::new().include::<Position>().exclude::<Health>(),
                &mut stores,
            )
            .unwrap();
        assert!(groups.get(with).unwrap().is_empty());
        assert_eq!(groups.get(without).unwrap().entities(), &[2]);

        stores.ensure::<Health>().unwrap();
        groups.attach(ComponentId::of::<Health>(), &mut stores);
        add(&mut groups, &mut stores, 2, Health);

        assert_eq!(groups.get(with).unwrap().entities(), &[2]);
        assert!(groups.get(without).unwrap().is_empty());
    }

    #[test]
    fn test_clear_removes_every_group() {
        let mut stores = stores();
        let mut groups = GroupRegistry::new(4, 16);
        let a = groups
            .get_or_build(Signature::new().include::<Position>(), &mut stores)
            .unwrap();
        let b = groups
            .get_or_build(
                Signature::new().include::<Velocity>().exclude::<Position>(),
                &mut stores,
            )
            .unwrap();

        groups.clear(&mut stores);
        assert!(groups.is_empty());
        assert!(groups.get(a).is_none());
        assert!(groups.get(b).is_none());
        assert!(stores.get::<Position>().unwrap().observers().is_empty());
        assert!(stores.get::<Velocity>().unwrap().observers().is_empty());

        // Freed slots are reusable afterwards.
        groups
            .get_or_build(Signature::new().include::<Position>(), &mut stores)
            .unwrap();
        assert_eq!(groups.len(), 1);
    }
}
