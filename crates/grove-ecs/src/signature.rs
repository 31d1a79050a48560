//! Signatures - canonical descriptions of a group query.
//!
//! A signature is a pair of sorted component-id lists plus a hash used for
//! fast rejection. Equality ignores the order in which types were added:
//!
//! ```
//! use grove_ecs::Signature;
//!
//! struct A;
//! struct B;
//! struct C;
//!
//! let one = Signature::new().include::<A>().include::<B>().exclude::<C>();
//! let two = Signature::new().exclude::<C>().include::<B>().include::<A>();
//! assert_eq!(one, two);
//! ```

use std::hash::{Hash, Hasher};

use smallvec::SmallVec;
use tracing::warn;

use crate::{
    component::{Component, ComponentId},
    error::{Error, Result},
    observer::Role,
};

type TermList = SmallVec<[ComponentId; 4]>;

/// Included and excluded component types of a group.
#[derive(Clone, Default)]
pub struct Signature {
    included: TermList,
    excluded: TermList,
    /// Commutative fold over all terms, so insertion order never matters.
    hash: u64,
    /// First component seen on both sides.
    conflict: Option<ComponentId>,
}

impl Signature {
    /// Create an empty signature.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require component `T`.
    #[must_use]
    pub fn include<T: Component>(self) -> Self {
        self.with_term(ComponentId::of::<T>(), Role::Included)
    }

    /// Reject entities with component `T`.
    #[must_use]
    pub fn exclude<T: Component>(self) -> Self {
        self.with_term(ComponentId::of::<T>(), Role::Excluded)
    }

    /// Add a term by raw component id.
    ///
    /// Insertion-sorts the id into its list; O(n) in the list length. Adding
    /// the same term twice is a no-op.
    #[must_use]
    pub fn with_term(mut self, id: ComponentId, role: Role) -> Self {
        let (list, other) = match role {
            Role::Included => (&mut self.included, &self.excluded),
            Role::Excluded => (&mut self.excluded, &self.included),
        };

        let position = match list.binary_search(&id) {
            Ok(_) => {
                warn!(component = ?id, ?role, "duplicate signature term ignored");
                return self;
            }
            Err(position) => position,
        };
        list.insert(position, id);

        if self.conflict.is_none() && other.binary_search(&id).is_ok() {
            self.conflict = Some(id);
        }
        self.hash = self.hash.wrapping_add(term_hash(id, role));
        self
    }

    /// Check that this signature can back a group.
    ///
    /// A group needs at least one included component to seed from, and a
    /// type cannot be both required and rejected.
    pub fn validate(&self) -> Result<()> {
        if let Some(component) = self.conflict {
            return Err(Error::ConflictingSignature { component });
        }
        if self.included.is_empty() {
            return Err(Error::EmptySignature);
        }
        Ok(())
    }

    /// Compare two signatures: hash and lengths first, then every term.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.hash == other.hash
            && self.included.len() == other.included.len()
            && self.excluded.len() == other.excluded.len()
            && self.included == other.included
            && self.excluded == other.excluded
    }

    /// Included component ids, ascending.
    #[must_use]
    pub fn included(&self) -> &[ComponentId] {
        &self.included
    }

    /// Excluded component ids, ascending.
    #[must_use]
    pub fn excluded(&self) -> &[ComponentId] {
        &self.excluded
    }

    /// Every term with its role, included first.
    pub fn terms(&self) -> impl Iterator<Item = (ComponentId, Role)> + '_ {
        let included = self.included.iter().map(|&id| (id, Role::Included));
        let excluded = self.excluded.iter().map(|&id| (id, Role::Excluded));
        included.chain(excluded)
    }

    /// Role of a component in this signature, if it appears.
    #[must_use]
    pub fn role_of(&self, id: ComponentId) -> Option<Role> {
        if self.included.binary_search(&id).is_ok() {
            Some(Role::Included)
        } else if self.excluded.binary_search(&id).is_ok() {
            Some(Role::Excluded)
        } else {
            None
        }
    }

    /// The precomputed fast-rejection hash.
    #[must_use]
    pub const fn hash_value(&self) -> u64 {
        self.hash
    }
}

/// Mix one term into 64 bits (splitmix64 finalizer).
const fn term_hash(id: ComponentId, role: Role) -> u64 {
    let salt = match role {
        Role::Included => 0,
        Role::Excluded => 1,
    };
    let mut z = (((id.as_raw() as u64) << 1) | salt).wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signature")
            .field("included", &self.included)
            .field("excluded", &self.excluded)
            .finish()
    }
}
