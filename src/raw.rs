use core::{alloc::Layout, mem, ptr::NonNull};

use alloc::alloc::handle_alloc_error;

use hoard_core::{AllocError, NonZeroLayout};

/// An uninitialized block of memory sized for a fixed number of `T` slots.
///
/// A `RawBuf` is pure extent: it never constructs or drops elements, and it
/// has no notion of which slots are live. The owner tracks liveness
/// separately and must drop any live elements before the buffer goes away,
/// otherwise they leak.
///
/// Two owners of one region are impossible by construction: `RawBuf` is not
/// `Clone`, and [`take`](RawBuf::take) leaves the source empty.
pub struct RawBuf<T> {
    ptr: NonNull<T>,
    cap: usize,
}

unsafe impl<T: Send> Send for RawBuf<T> {}
unsafe impl<T: Sync> Sync for RawBuf<T> {}

impl<T> RawBuf<T> {
    /// An unallocated buffer. Zero-sized element types never allocate, so
    /// their capacity is unbounded from the start.
    pub const fn new() -> Self {
        Self {
            ptr: NonNull::dangling(),
            cap: if mem::size_of::<T>() == 0 {
                usize::MAX
            } else {
                0
            },
        }
    }

    /// Acquires a buffer for exactly `cap` elements, aborting on allocation
    /// failure.
    ///
    /// # Panics
    /// Panics if the byte size of `cap` elements overflows.
    pub fn with_capacity(cap: usize) -> Self {
        match Self::try_with_capacity(cap) {
            Ok(buf) => buf,
            Err(_) => handle_alloc_error(Self::array_layout(cap)),
        }
    }

    /// Fallible variant of [`with_capacity`](RawBuf::with_capacity).
    pub fn try_with_capacity(cap: usize) -> Result<Self, AllocError> {
        let layout = Self::array_layout(cap);
        let Some(layout) = NonZeroLayout::new(layout) else {
            // cap == 0 or T is zero sized; no bytes back the buffer.
            return Ok(Self::new());
        };
        let ptr = hoard_core::allocate(layout)?;
        Ok(Self {
            ptr: ptr.cast(),
            cap,
        })
    }

    fn array_layout(cap: usize) -> Layout {
        Layout::array::<T>(cap).expect("capacity overflow")
    }

    #[inline]
    pub fn cap(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Returns the address of slot `offset`.
    ///
    /// # Safety
    /// `offset` must be at most `cap`. One past the end is valid to form but
    /// never to read or write through. Whether the slot holds a live value
    /// is entirely the caller's business.
    #[inline]
    pub unsafe fn slot(&self, offset: usize) -> *mut T {
        debug_assert!(offset <= self.cap);
        self.ptr.as_ptr().add(offset)
    }

    /// Exchanges the two regions in O(1). No element is touched.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.ptr, &mut other.ptr);
        mem::swap(&mut self.cap, &mut other.cap);
    }

    /// Transfers ownership of the region out, leaving `self` unallocated.
    #[inline]
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::new())
    }
}

impl<T> Default for RawBuf<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for RawBuf<T> {
    fn drop(&mut self) {
        // `cap` records exactly what was allocated; a zero-size layout means
        // nothing was.
        let layout = Layout::array::<T>(self.cap).ok().and_then(NonZeroLayout::new);
        if let Some(layout) = layout {
            unsafe { hoard_core::deallocate(self.ptr.cast(), layout) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_unallocated() {
        let buf = RawBuf::<u32>::new();
        assert_eq!(buf.cap(), 0);
    }

    #[test]
    fn with_capacity_zero_does_not_allocate() {
        let buf = RawBuf::<u32>::with_capacity(0);
        assert_eq!(buf.cap(), 0);
        assert_eq!(buf.as_ptr(), NonNull::dangling().as_ptr());
    }

    #[test]
    fn with_capacity_reports_requested_extent() {
        let buf = RawBuf::<u64>::with_capacity(12);
        assert_eq!(buf.cap(), 12);
    }

    #[test]
    fn slot_addresses_are_contiguous() {
        let buf = RawBuf::<u64>::with_capacity(4);
        unsafe {
            assert_eq!(buf.slot(0), buf.as_ptr());
            assert_eq!(buf.slot(3), buf.as_ptr().add(3));
            // One past the end is a valid address to form.
            assert_eq!(buf.slot(4), buf.as_ptr().add(4));
        }
    }

    #[test]
    fn take_moves_ownership_and_empties_source() {
        let mut buf = RawBuf::<u8>::with_capacity(16);
        let addr = buf.as_ptr();
        let taken = buf.take();
        assert_eq!(taken.cap(), 16);
        assert_eq!(taken.as_ptr(), addr);
        assert_eq!(buf.cap(), 0);
    }

    #[test]
    fn swap_exchanges_extent() {
        let mut a = RawBuf::<u16>::with_capacity(2);
        let mut b = RawBuf::<u16>::with_capacity(5);
        let (pa, pb) = (a.as_ptr(), b.as_ptr());
        a.swap(&mut b);
        assert_eq!((a.cap(), a.as_ptr()), (5, pb));
        assert_eq!((b.cap(), b.as_ptr()), (2, pa));
    }

    #[test]
    fn zero_sized_elements_have_unbounded_capacity() {
        let buf = RawBuf::<()>::with_capacity(7);
        assert_eq!(buf.cap(), usize::MAX);
        assert_eq!(RawBuf::<()>::new().cap(), usize::MAX);
    }

    #[test]
    fn try_with_capacity_matches_infallible_path() {
        let buf = RawBuf::<u32>::try_with_capacity(3).unwrap();
        assert_eq!(buf.cap(), 3);
    }
}
