// SPDX-License-Identifier: Apache-2.0

//! Configuration dependent, transparent aliases for the
//! [`Zeroize`](https://docs.rs/zeroize/latest/zeroize/trait.Zeroize.html) crate.
//!
//! Depending on whether or not the `zeroize` Cargo feature is enabled,
//! [`Zeroize`], [`ZeroizeOnDrop`] and [`Zeroizing`] are either defined as
//! aliases to the actual definitions from the
//! [`zeroize` crate](https://docs.rs/zeroize/latest/zeroize/index.html) or to
//! trivial drop-in substitutes.

#[cfg(feature = "zeroize")]
#[doc(hidden)]
mod cfg {
    pub use zeroize::Zeroize;
    pub use zeroize::ZeroizeOnDrop;
    pub use zeroize::Zeroizing;
}

#[cfg(not(feature = "zeroize"))]
#[doc(hidden)]
mod cfg {
    use core::ops;

    pub trait Zeroize {
        fn zeroize(&mut self);
    }

    impl<T> Zeroize for T {
        fn zeroize(&mut self) {}
    }

    pub trait ZeroizeOnDrop {}

    #[derive(Clone, Copy)]
    #[repr(transparent)]
    pub struct Zeroizing<T>(T);

    impl<T> ops::Deref for Zeroizing<T> {
        type Target = T;

        fn deref(&self) -> &Self::Target {
            &self.0
        }
    }

    impl<T> ops::DerefMut for Zeroizing<T> {
        fn deref_mut(&mut self) -> &mut Self::Target {
            &mut self.0
        }
    }

    impl<T> From<T> for Zeroizing<T> {
        fn from(value: T) -> Self {
            Self(value)
        }
    }
}

/// Configuration abstraction alias definition for
/// [`zeroize::Zeroize`](https://docs.rs/zeroize/latest/zeroize/trait.Zeroize.html).
///
/// Depending on whether or not the Cargo feature `zeroize` is enabled, this is
/// either an alias to the real [`zeroize::Zeroize`](https://docs.rs/zeroize/latest/zeroize/trait.Zeroize.html)
/// or to some API compatible drop-in substitute implemented trivially for any
/// type.
pub use cfg::Zeroize;

/// Configuration abstraction alias definition for
/// [`zeroize::ZeroizeOnDrop`](https://docs.rs/zeroize/latest/zeroize/trait.ZeroizeOnDrop.html).
///
/// Depending on whether or not the Cargo feature `zeroize` is enabled, this is
/// either an alias to the real [`zeroize::ZeroizeOnDrop`](https://docs.rs/zeroize/latest/zeroize/trait.ZeroizeOnDrop.html)
/// or to some API compatible drop-in substitute.
pub use cfg::ZeroizeOnDrop;

/// Configuration abstraction alias definition for
/// [`zeroize::Zeroizing`](https://docs.rs/zeroize/latest/zeroize/struct.Zeroizing.html).
///
/// Depending on whether or not the Cargo feature `zeroize` is enabled, this is
/// either an alias to the real [`zeroize::Zeroizing`](https://docs.rs/zeroize/latest/zeroize/struct.Zeroizing.html)
/// or to some trivial, API compatible drop-in substitute.
pub use cfg::Zeroizing;
