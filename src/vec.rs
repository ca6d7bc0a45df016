use core::{
    cmp, fmt, mem,
    ops::{Deref, DerefMut},
    ptr, slice,
};

use hoard_core::AllocError;

use crate::raw::RawBuf;

/// A growable contiguous container over a single raw storage block.
///
/// Slots `[0, len)` of the backing [`RawBuf`] hold live values; slots
/// `[len, capacity)` are uninitialized memory. Every operation that grows
/// capacity builds the replacement block completely before adopting it, so a
/// panic out of element code or an allocation failure leaves the hoard
/// exactly as it was.
pub struct Hoard<T> {
    buf: RawBuf<T>,
    len: usize,
}

impl<T> Hoard<T> {
    /// An empty hoard. Does not allocate.
    pub const fn new() -> Self {
        Self {
            buf: RawBuf::new(),
            len: 0,
        }
    }

    /// An empty hoard backed by exactly `cap` slots.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: RawBuf::with_capacity(cap),
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.cap()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.buf.as_ptr(), self.len) }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// # Safety
    /// `index` must be below `len`. Violations are caught by a debug
    /// assertion only; in release builds they are undefined behavior.
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(index < self.len);
        &*self.buf.slot(index)
    }

    /// # Safety
    /// Same contract as [`get_unchecked`](Hoard::get_unchecked).
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.len);
        &mut *self.buf.slot(index)
    }

    /// Grows capacity to exactly `new_cap`. Does nothing when `new_cap` is
    /// at or under the current capacity; element addresses are stable in
    /// that case.
    pub fn reserve(&mut self, new_cap: usize) {
        if new_cap > self.capacity() {
            let new = RawBuf::with_capacity(new_cap);
            unsafe { self.relocate_into(new) };
        }
    }

    /// Fallible [`reserve`](Hoard::reserve): on `Err` the hoard is
    /// completely unchanged.
    pub fn try_reserve(&mut self, new_cap: usize) -> Result<(), AllocError> {
        if new_cap > self.capacity() {
            let new = RawBuf::try_with_capacity(new_cap)?;
            unsafe { self.relocate_into(new) };
        }
        Ok(())
    }

    /// Appends `value`, growing to `max(1, 2 * len)` slots when full.
    /// Returns a reference to the slot the value landed in.
    #[inline]
    pub fn push(&mut self, value: T) -> &mut T {
        self.push_with(move || value)
    }

    /// Appends the result of `f`, built directly in its final slot.
    ///
    /// On the growth path the element is constructed in the replacement
    /// buffer before any live element moves, so a panic inside `f` releases
    /// only the unadopted block and the hoard keeps its length, capacity,
    /// and every element.
    pub fn push_with<F>(&mut self, f: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        unsafe {
            if self.len == self.capacity() {
                let new = RawBuf::with_capacity(self.amortized_cap());
                ptr::write(new.slot(self.len), f());
                self.relocate_into(new);
            } else {
                ptr::write(self.buf.slot(self.len), f());
            }
            self.len += 1;
            &mut *self.buf.slot(self.len - 1)
        }
    }

    /// Removes and returns the last element, or `None` when empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        unsafe { Some(ptr::read(self.buf.slot(self.len))) }
    }

    /// Places `value` at `index`, shifting everything from `index` on one
    /// slot to the right. `index` may equal `len`.
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) -> &mut T {
        assert!(index <= self.len, "insert index out of range");
        unsafe {
            if self.len == self.capacity() {
                // The new element goes straight to its final slot; the old
                // elements are then relocated around it.
                let mut new = RawBuf::with_capacity(self.amortized_cap());
                ptr::write(new.slot(index), value);
                ptr::copy_nonoverlapping(self.buf.as_ptr(), new.as_ptr(), index);
                ptr::copy_nonoverlapping(
                    self.buf.slot(index),
                    new.slot(index + 1),
                    self.len - index,
                );
                self.buf.swap(&mut new);
            } else {
                ptr::copy(
                    self.buf.slot(index),
                    self.buf.slot(index + 1),
                    self.len - index,
                );
                ptr::write(self.buf.slot(index), value);
            }
            self.len += 1;
            &mut *self.buf.slot(index)
        }
    }

    /// Removes and returns the element at `index`, shifting the tail one
    /// slot to the left.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(index < self.len, "remove index out of range");
        unsafe {
            let value = ptr::read(self.buf.slot(index));
            ptr::copy(
                self.buf.slot(index + 1),
                self.buf.slot(index),
                self.len - index - 1,
            );
            self.len -= 1;
            value
        }
    }

    /// Drops every element past `new_len`. Does nothing when `new_len >= len`.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len {
            return;
        }
        let tail = self.len - new_len;
        unsafe {
            // Lower `len` first so a panicking destructor cannot expose the
            // half-dropped tail.
            self.len = new_len;
            let base = self.buf.slot(new_len);
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base, tail));
        }
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Exchanges contents with `other` in O(1): storage and length both, no
    /// element touched. Named apart from `<[T]>::swap` so element swaps stay
    /// reachable through `Deref`.
    pub fn swap_with(&mut self, other: &mut Self) {
        self.buf.swap(&mut other.buf);
        mem::swap(&mut self.len, &mut other.len);
    }

    /// Moves the contents out, leaving `self` valid and empty with no
    /// allocation.
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    fn amortized_cap(&self) -> usize {
        cmp::max(1, self.len.checked_mul(2).expect("capacity overflow"))
    }

    /// Moves the live elements into `new` and adopts it, releasing the old
    /// block. Relocation is a bitwise move and cannot fail, so by the time
    /// this runs the operation as a whole can no longer be observed
    /// half-done.
    ///
    /// # Safety
    /// `new.cap()` must be at least `self.len`.
    unsafe fn relocate_into(&mut self, mut new: RawBuf<T>) {
        debug_assert!(self.len <= new.cap());
        ptr::copy_nonoverlapping(self.buf.as_ptr(), new.as_ptr(), self.len);
        self.buf.swap(&mut new);
        // `new` now holds the old block; dropping it frees the bytes. The
        // elements moved out of it bitwise, so no destructor runs here.
    }
}

impl<T: Default> Hoard<T> {
    /// A hoard of `n` default values backed by exactly `n` slots.
    pub fn with_len(n: usize) -> Self {
        let mut hoard = Self::with_capacity(n);
        unsafe { hoard.fill_default(n) };
        hoard
    }

    /// Grows or shrinks to exactly `new_len` elements, default-constructing
    /// the new tail when growing.
    ///
    /// When growth requires a bigger block, the new tail is built in the
    /// replacement buffer before adoption: a panicking `default` leaves
    /// length, capacity, and every element untouched.
    pub fn resize(&mut self, new_len: usize) {
        if new_len <= self.len {
            self.truncate(new_len);
        } else if new_len <= self.capacity() {
            unsafe { self.fill_default(new_len) };
        } else {
            self.resize_grow(new_len);
        }
    }

    #[cold]
    #[inline(never)]
    fn resize_grow(&mut self, new_len: usize) {
        let mut new = RawBuf::with_capacity(new_len);
        unsafe {
            let mut tail = TailGuard {
                buf: &mut new,
                start: self.len,
                end: self.len,
            };
            while tail.end < new_len {
                ptr::write(tail.buf.slot(tail.end), T::default());
                tail.end += 1;
            }
            mem::forget(tail);
            self.relocate_into(new);
            self.len = new_len;
        }
    }

    /// Default-constructs slots `[len, new_len)` in place.
    ///
    /// # Safety
    /// `new_len` must be at most the current capacity.
    unsafe fn fill_default(&mut self, new_len: usize) {
        debug_assert!(new_len <= self.capacity());
        let start = self.len;
        let mut guard = FillGuard {
            hoard: self,
            constructed: start,
        };
        while guard.constructed < new_len {
            ptr::write(guard.hoard.buf.slot(guard.constructed), T::default());
            guard.constructed += 1;
        }
        guard.hoard.len = new_len;
        mem::forget(guard);
    }
}

/// Drops the freshly constructed prefix of an in-place fill when element
/// code panics, restoring the owner to its pre-call state.
struct FillGuard<'a, T> {
    hoard: &'a mut Hoard<T>,
    constructed: usize,
}

impl<T> Drop for FillGuard<'_, T> {
    fn drop(&mut self) {
        let start = self.hoard.len;
        let count = self.constructed - start;
        unsafe {
            let base = self.hoard.buf.slot(start);
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base, count));
        }
    }
}

/// Drops the elements built so far into a not-yet-adopted replacement
/// buffer when element code panics. The buffer itself is freed by its own
/// drop afterwards.
struct TailGuard<'a, T> {
    buf: &'a mut RawBuf<T>,
    start: usize,
    end: usize,
}

impl<T> Drop for TailGuard<'_, T> {
    fn drop(&mut self) {
        unsafe {
            let base = self.buf.slot(self.start);
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base, self.end - self.start));
        }
    }
}

impl<T> Drop for Hoard<T> {
    fn drop(&mut self) {
        unsafe { ptr::drop_in_place(self.as_mut_slice() as *mut [T]) };
        // `buf` releases the bytes afterwards.
    }
}

impl<T: Clone> Clone for Hoard<T> {
    /// Allocates exactly `len` slots and clones each element in order. A
    /// panic mid-clone unwinds the constructed prefix and the fresh block
    /// before any new hoard exists.
    fn clone(&self) -> Self {
        let mut new = RawBuf::with_capacity(self.len);
        unsafe {
            let mut tail = TailGuard {
                buf: &mut new,
                start: 0,
                end: 0,
            };
            for value in self.as_slice() {
                ptr::write(tail.buf.slot(tail.end), value.clone());
                tail.end += 1;
            }
            mem::forget(tail);
        }
        Self {
            buf: new,
            len: self.len,
        }
    }

    /// Reuses the existing block when it is big enough.
    ///
    /// When `source.len()` exceeds the current capacity, a complete clone is
    /// built first and adopted by swap, so a panic leaves `self` untouched.
    /// Otherwise the assignment happens in place, branching on the current
    /// *length*: the overlap is updated by element-level `clone_from`, then
    /// either the extra source elements are clone-constructed into the tail
    /// (length advanced one slot at a time, so an unwind leaves a valid
    /// hoard) or the excess elements of `self` are dropped.
    fn clone_from(&mut self, source: &Self) {
        if source.len > self.capacity() {
            let mut fresh = source.clone();
            self.swap_with(&mut fresh);
            return;
        }
        for (dst, src) in self.as_mut_slice().iter_mut().zip(source.as_slice()) {
            dst.clone_from(src);
        }
        if source.len > self.len {
            for src in &source.as_slice()[self.len..] {
                unsafe {
                    ptr::write(self.buf.slot(self.len), src.clone());
                }
                self.len += 1;
            }
        } else {
            self.truncate(source.len);
        }
    }
}

impl<T> Default for Hoard<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for Hoard<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for Hoard<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: fmt::Debug> fmt::Debug for Hoard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: PartialEq> PartialEq for Hoard<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for Hoard<T> {}

impl<T: PartialEq, const N: usize> PartialEq<[T; N]> for Hoard<T> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == &other[..]
    }
}

impl<T: PartialEq> PartialEq<&[T]> for Hoard<T> {
    fn eq(&self, other: &&[T]) -> bool {
        self.as_slice() == *other
    }
}

impl<T> AsRef<[T]> for Hoard<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> AsMut<[T]> for Hoard<T> {
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> Extend<T> for Hoard<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<T> FromIterator<T> for Hoard<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut hoard = Self::new();
        hoard.extend(iter);
        hoard
    }
}

impl<'a, T> IntoIterator for &'a Hoard<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Hoard<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
