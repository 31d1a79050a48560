//! Component type identity.
//!
//! Every distinct Rust type used as a component gets one stable
//! [`ComponentId`], assigned from a process-wide monotonic counter the first
//! time the type is seen. The id is what signatures sort and hash, and what
//! the store registry dispatches on.

use std::{
    any::TypeId,
    fmt,
    sync::{
        LazyLock,
        atomic::{AtomicU32, Ordering},
    },
};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Marker trait for types that can be used as components.
///
/// # Example
///
/// ```
/// struct Position { x: f32, y: f32 }
/// // Any `Send + Sync + 'static` type is a component.
/// let id = grove_ecs::ComponentId::of::<Position>();
/// assert_eq!(id, grove_ecs::ComponentId::of::<Position>());
/// ```
pub trait Component: Send + Sync + 'static {}

// Blanket implementation for all suitable types
impl<T: Send + Sync + 'static> Component for T {}

/// Global counter for generating unique component IDs.
static NEXT_COMPONENT_ID: AtomicU32 = AtomicU32::new(0);

/// Ids already handed out, keyed by Rust type.
static TYPE_IDS: LazyLock<RwLock<FxHashMap<TypeId, ComponentId>>> =
    LazyLock::new(|| RwLock::new(FxHashMap::default()));

/// Unique identifier for a component type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u32);

impl ComponentId {
    /// Get the id for `T`, assigning the next free id on first use.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        let type_id = TypeId::of::<T>();

        if let Some(&id) = TYPE_IDS.read().get(&type_id) {
            return id;
        }

        *TYPE_IDS
            .write()
            .entry(type_id)
            .or_insert_with(|| Self(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed)))
    }

    /// Create a component ID from a raw value.
    #[must_use]
    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

/// Runtime information about a component type.
#[derive(Clone)]
pub struct ComponentInfo {
    id: ComponentId,
    /// Type name for debugging.
    name: &'static str,
    size: usize,
}

impl ComponentInfo {
    /// Create component info for a concrete type.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self {
            id: ComponentId::of::<T>(),
            name: std::any::type_name::<T>(),
            size: std::mem::size_of::<T>(),
        }
    }

    /// Get the component ID.
    #[must_use]
    pub const fn id(&self) -> ComponentId {
        self.id
    }

    /// Get the component type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Get the size in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Zero-sized components are tags: presence only, no payload.
    #[must_use]
    pub const fn is_tag(&self) -> bool {
        self.size == 0
    }
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("size", &self.size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position {
        x: f32,
        y: f32,
    }

    struct Velocity {
        x: f32,
        y: f32,
    }

    struct Frozen;

    #[test]
    fn test_component_ids_are_stable() {
        let pos_id = ComponentId::of::<Position>();
        let vel_id = ComponentId::of::<Velocity>();

        assert_ne!(pos_id, vel_id);
        assert_eq!(ComponentId::of::<Position>(), pos_id);
        assert_eq!(ComponentId::of::<Velocity>(), vel_id);
    }

    #[test]
    fn test_ids_are_assigned_monotonically() {
        struct First;
        struct Second;

        let first = ComponentId::of::<First>();
        let second = ComponentId::of::<Second>();
        assert!(second > first);
    }

    #[test]
    fn test_component_info() {
        let info = ComponentInfo::of::<Position>();

        assert_eq!(info.id(), ComponentId::of::<Position>());
        assert_eq!(info.size(), std::mem::size_of::<Position>());
        assert!(info.name().ends_with("Position"));
        assert!(!info.is_tag());
    }

    #[test]
    fn test_tag_info() {
        let info = ComponentInfo::of::<Frozen>();
        assert!(info.is_tag());
    }
}
