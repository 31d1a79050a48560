//! Observer lists for store notifications.
//!
//! Stores do not hold callbacks. Each store keeps an ordered list of
//! [`Subscription`]s naming the groups that watch it and in which role; the
//! world walks that list synchronously after every create/remove, so a
//! group's cache is consistent as soon as the mutating call returns.

use smallvec::SmallVec;

use crate::group::GroupId;

/// A change to a component store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// A component was created on an entity.
    Created,
    /// A component was removed from an entity.
    Removed,
}

/// How a group watches a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Members must have the component.
    Included,
    /// Members must not have the component.
    Excluded,
}

/// What a group does with an entity after a store event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reaction {
    /// Re-run the membership test and add on pass.
    TryInclude,
    /// Drop the entity if it is a member.
    TryExclude,
}

impl Role {
    /// Map a store event to the group reaction for this role.
    ///
    /// Excluded stores invert the roles of create and remove.
    #[must_use]
    pub const fn reaction(self, event: StoreEvent) -> Reaction {
        match (self, event) {
            (Self::Included, StoreEvent::Created) | (Self::Excluded, StoreEvent::Removed) => {
                Reaction::TryInclude
            }
            (Self::Included, StoreEvent::Removed) | (Self::Excluded, StoreEvent::Created) => {
                Reaction::TryExclude
            }
        }
    }
}

/// A group's registration on a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub group: GroupId,
    pub role: Role,
}

/// Ordered list of registrations.
#[derive(Clone, Debug)]
pub struct Observers<T> {
    list: SmallVec<[T; 4]>,
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Observers<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            list: SmallVec::new(),
        }
    }

    /// Append a registration; notifications follow registration order.
    pub fn subscribe(&mut self, observer: T) {
        self.list.push(observer);
    }

    /// Remove the first matching registration, keeping the order of the rest.
    pub fn unsubscribe(&mut self, observer: &T) -> bool
    where
        T: PartialEq,
    {
        match self.list.iter().position(|o| o == observer) {
            Some(index) => {
                self.list.remove(index);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.list
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reactions() {
        use Reaction::{TryExclude, TryInclude};

        assert_eq!(Role::Included.reaction(StoreEvent::Created), TryInclude);
        assert_eq!(Role::Included.reaction(StoreEvent::Removed), TryExclude);
        assert_eq!(Role::Excluded.reaction(StoreEvent::Created), TryExclude);
        assert_eq!(Role::Excluded.reaction(StoreEvent::Removed), TryInclude);
    }

    #[test]
    fn test_unsubscribe_keeps_order() {
        let mut observers = Observers::new();
        observers.subscribe(1);
        observers.subscribe(2);
        observers.subscribe(3);

        assert!(observers.unsubscribe(&2));
        assert!(!observers.unsubscribe(&2));
        assert_eq!(observers.as_slice(), &[1, 3]);
    }
}
