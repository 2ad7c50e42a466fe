//! Typed `u32` keys for atoms, nets, molecules, clusters and tile types.
//!
//! All of them come from [`define_id!`], so each can key an [`Arena`], sorts
//! by index and prints as its bare number.
//!
//! [`Arena`]: crate::Arena

/// Declares a `u32` newtype key that also implements
/// [`ArenaId`](crate::ArenaId).
///
/// ```
/// tessel_common::define_id!(
///     /// Key of a placement site.
///     SiteId
/// );
///
/// let id = SiteId::from_raw(3);
/// assert_eq!(id.as_raw(), 3);
/// assert_eq!(id.index(), 3);
/// ```
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Key for dense position `index`.
            pub fn from_raw(index: u32) -> Self {
                $name(index)
            }

            /// Dense position of this key.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Position as a `usize`, for side tables kept in plain `Vec`s.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl $crate::ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                $name::from_raw(index)
            }

            fn as_raw(self) -> u32 {
                $name::as_raw(self)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}
