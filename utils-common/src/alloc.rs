// SPDX-License-Identifier: Apache-2.0

//! Helpers related to `alloc`.

extern crate alloc;
use alloc::{boxed::Box, vec::Vec};
use core::{mem, ptr};

use crate::zeroize;

/// Memory allocation error.
#[derive(Clone, Copy, Debug)]
pub enum TryNewError {
    /// Memory allocation failure.
    MemoryAllocationFailure,
}

/// Try to allocate a `Box`, handling allocation failure gracefully.
///
/// `Box::try_new()` is still unstable, so this implements an alternative
/// `Box` instantiation primitive enabling graceful memory allocation
/// failure handling.
///
/// # Arguments:
///
/// * `v` - The value to wrap in a `Box`.
///
/// # Errors:
///
/// * [`TryNewError::MemoryAllocationFailure`] - The memory allocation has
///   failed.
pub fn box_try_new<T>(v: T) -> Result<Box<T>, TryNewError> {
    // Refer to https://doc.rust-lang.org/std/boxed/index.html#memory-layout.
    let p: *mut T = if mem::size_of::<T>() == 0 {
        // Dangling pointers are valid for ZSTs and the write below is Ok.
        ptr::NonNull::dangling().as_ptr()
    } else {
        let layout = alloc::alloc::Layout::new::<T>();
        let p: *mut T = unsafe { alloc::alloc::alloc(layout) } as *mut T;
        if p.is_null() {
            return Err(TryNewError::MemoryAllocationFailure);
        }
        p
    };

    unsafe { p.write(v) };

    Ok(unsafe { Box::from_raw(p) })
}

/// Convenience helper to allocate a default-initialized `Vec` of a given
/// length, handling memory allocation failure gracefully.
///
/// # Arguments:
///
/// * `len` - The length to resize the `Vec` to.
///
/// # Errors:
///
/// * [`TryNewError::MemoryAllocationFailure`] - The memory allocation has
///   failed.
pub fn try_alloc_vec<T: Default + Clone>(len: usize) -> Result<Vec<T>, TryNewError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| TryNewError::MemoryAllocationFailure)?;
    v.resize(len, T::default());
    Ok(v)
}

/// Convenience helper to allocate a default-initialized and
/// [`Zeroizing`](zeroize::Zeroizing) wrapped `Vec` of a given length,
/// handling memory allocation failure gracefully.
///
/// # Arguments:
///
/// * `len` - The length to resize the `Vec` to.
///
/// # Errors:
///
/// * [`TryNewError::MemoryAllocationFailure`] - The memory allocation has
///   failed.
pub fn try_alloc_zeroizing_vec<T: zeroize::Zeroize + Default + Clone>(
    len: usize,
) -> Result<zeroize::Zeroizing<Vec<T>>, TryNewError> {
    Ok(try_alloc_vec(len)?.into())
}
