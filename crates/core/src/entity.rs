//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Stores key entities by [`Entity::id`]; for catalog products the identity is
/// the natural key (the product name), not a surrogate.
pub trait Entity {
    /// Identifier type. Borrowed form is enough for map lookups.
    type Id: ?Sized + Eq + core::hash::Hash + core::fmt::Debug + ToOwned;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
