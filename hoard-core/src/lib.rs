#![no_std]

extern crate alloc;

use core::{alloc::Layout, fmt, num::NonZeroUsize, ptr::NonNull};

/// Returned when the global allocator cannot satisfy a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory allocation failed")
    }
}

impl core::error::Error for AllocError {}

/// A [`Layout`] with a size known to be nonzero.
///
/// The global allocator's contract forbids zero-size requests, so every
/// request routed through this module carries the proof in its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonZeroLayout {
    layout: Layout,
}

impl NonZeroLayout {
    pub fn new(layout: Layout) -> Option<Self> {
        if layout.size() == 0 {
            None
        } else {
            Some(Self { layout })
        }
    }

    pub fn nonzero_size(&self) -> NonZeroUsize {
        let size = self.layout.size();
        unsafe { NonZeroUsize::new_unchecked(size) }
    }

    pub fn size(&self) -> usize {
        self.nonzero_size().get()
    }

    pub fn align(&self) -> usize {
        self.get().align()
    }

    pub fn get(&self) -> Layout {
        self.layout
    }
}

/// Acquires an uninitialized block of bytes from the global allocator.
pub fn allocate(layout: NonZeroLayout) -> Result<NonNull<u8>, AllocError> {
    let ptr = unsafe { alloc::alloc::alloc(layout.get()) };
    NonNull::new(ptr).ok_or(AllocError)
}

/// Releases a block previously acquired through [`allocate`].
///
/// # Safety
/// - The pointer must be the same as given by a previous call to `allocate`.
/// - The layout must be identical to that used when allocating the pointer.
/// - The block must not be released twice.
pub unsafe fn deallocate(ptr: NonNull<u8>, layout: NonZeroLayout) {
    alloc::alloc::dealloc(ptr.as_ptr(), layout.get())
}
