//! Type-erased dynamic array, the container behind every Vela array value.
//!
//! Generated code sees arrays as opaque `VelaArray` pointers and manipulates
//! them through the `vela_array_*` functions. Element types are erased down
//! to a fixed byte width chosen at construction; the container only moves
//! bytes, so one implementation serves every element type the compiler
//! produces.
//!
//! The inherent methods return `RuntimeResult` and never terminate the
//! process; the C ABI wrappers unwrap them and abort on failure, which is
//! the only failure mode generated code understands.

use std::{
    alloc::{Layout, alloc, dealloc},
    ptr, slice,
};

use crate::{
    builtins::{die, fatal},
    error::{RuntimeError, RuntimeResult},
};

/// Capacity used when a caller asks for zero.
const DEFAULT_CAPACITY: usize = 16;

/// Buffers are aligned like `malloc` output so generated code can store any
/// primitive element type directly.
const DATA_ALIGN: usize = 16;

fn alloc_buffer(capacity: usize, element_size: usize) -> RuntimeResult<*mut u8> {
    let size = capacity
        .checked_mul(element_size)
        .ok_or(RuntimeError::OutOfMemory)?;
    if size == 0 {
        // Nothing to allocate; any aligned non-null pointer supports
        // zero-length reads.
        return Ok(DATA_ALIGN as *mut u8);
    }
    let layout =
        Layout::from_size_align(size, DATA_ALIGN).map_err(|_| RuntimeError::OutOfMemory)?;
    let data = unsafe { alloc(layout) };
    if data.is_null() {
        return Err(RuntimeError::OutOfMemory);
    }
    Ok(data)
}

/// # Safety
/// `data` must have come from `alloc_buffer(capacity, element_size)` with
/// the same capacity and element size, and must not be freed twice.
unsafe fn dealloc_buffer(data: *mut u8, capacity: usize, element_size: usize) {
    // The product cannot overflow: the matching alloc_buffer call succeeded.
    let size = capacity * element_size;
    if size == 0 || data.is_null() {
        return;
    }
    unsafe {
        let layout = Layout::from_size_align_unchecked(size, DATA_ALIGN);
        dealloc(data, layout);
    }
}

/// Growable sequence of fixed-width elements with exclusively owned storage.
///
/// `length <= capacity` always holds, elements occupy the contiguous run
/// `[0, length)`, and `element_size` never changes after construction.
#[repr(C)]
#[derive(Debug, PartialEq)]
pub struct VelaArray {
    data: *mut u8,
    length: usize,
    capacity: usize,
    element_size: usize,
}

impl VelaArray {
    /// Create an empty array for elements of `element_size` bytes.
    ///
    /// A zero `initial_capacity` falls back to [`DEFAULT_CAPACITY`].
    pub fn with_capacity(element_size: usize, initial_capacity: usize) -> RuntimeResult<Self> {
        let capacity = if initial_capacity > 0 {
            initial_capacity
        } else {
            DEFAULT_CAPACITY
        };
        let data = alloc_buffer(capacity, element_size)?;
        Ok(Self {
            data,
            length: 0,
            capacity,
            element_size,
        })
    }

    /// Number of live elements, not the storage capacity.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Append one element of exactly `element_size` bytes, doubling the
    /// storage first when it is full. Amortized O(1) per push.
    pub fn push(&mut self, element: &[u8]) -> RuntimeResult<()> {
        assert_eq!(
            element.len(),
            self.element_size,
            "pushed element has the wrong byte width"
        );
        if self.length == self.capacity {
            self.grow()?;
        }
        if self.element_size > 0 {
            unsafe {
                ptr::copy_nonoverlapping(
                    element.as_ptr(),
                    self.data.add(self.length * self.element_size),
                    self.element_size,
                );
            }
        }
        self.length += 1;
        Ok(())
    }

    /// Bytes of the element at `index`.
    ///
    /// The slice aliases the array's storage; the borrow keeps the array
    /// immutable for as long as it lives, so it cannot outlive a
    /// reallocating push.
    pub fn get(&self, index: usize) -> RuntimeResult<&[u8]> {
        if index >= self.length {
            return Err(RuntimeError::IndexOutOfBounds {
                index,
                length: self.length,
            });
        }
        Ok(unsafe {
            slice::from_raw_parts(self.data.add(index * self.element_size), self.element_size)
        })
    }

    /// New independent array holding a copy of elements `[start, end)`.
    ///
    /// `start == end` is legal and yields an empty array. The result's
    /// capacity is the slice length as requested, which for an empty slice
    /// means the construction-time default minimum.
    pub fn slice(&self, start: usize, end: usize) -> RuntimeResult<Self> {
        if start > end || end > self.length {
            return Err(RuntimeError::InvalidSliceRange {
                start,
                end,
                length: self.length,
            });
        }
        let new_length = end - start;
        let mut out = Self::with_capacity(self.element_size, new_length)?;
        if new_length > 0 && self.element_size > 0 {
            unsafe {
                ptr::copy_nonoverlapping(
                    self.data.add(start * self.element_size),
                    out.data,
                    new_length * self.element_size,
                );
            }
        }
        out.length = new_length;
        Ok(out)
    }

    /// New independent array holding `self`'s elements followed by
    /// `other`'s, both in their original order.
    ///
    /// The element widths must match; the check happens before any
    /// allocation.
    pub fn concat(&self, other: &Self) -> RuntimeResult<Self> {
        if self.element_size != other.element_size {
            return Err(RuntimeError::ElementSizeMismatch {
                left: self.element_size,
                right: other.element_size,
            });
        }
        let total = self
            .length
            .checked_add(other.length)
            .ok_or(RuntimeError::OutOfMemory)?;
        let mut out = Self::with_capacity(self.element_size, total)?;
        if self.element_size > 0 {
            unsafe {
                ptr::copy_nonoverlapping(
                    self.data,
                    out.data,
                    self.length * self.element_size,
                );
                ptr::copy_nonoverlapping(
                    other.data,
                    out.data.add(self.length * self.element_size),
                    other.length * self.element_size,
                );
            }
        }
        out.length = total;
        Ok(out)
    }

    /// Double the capacity, moving the live elements to the new buffer at
    /// their original offsets.
    fn grow(&mut self) -> RuntimeResult<()> {
        let new_capacity = self
            .capacity
            .checked_mul(2)
            .ok_or(RuntimeError::OutOfMemory)?;
        let new_data = alloc_buffer(new_capacity, self.element_size)?;
        let live_bytes = self.length * self.element_size;
        if live_bytes > 0 {
            unsafe {
                ptr::copy_nonoverlapping(self.data, new_data, live_bytes);
            }
        }
        unsafe {
            dealloc_buffer(self.data, self.capacity, self.element_size);
        }
        self.data = new_data;
        self.capacity = new_capacity;
        Ok(())
    }
}

impl Drop for VelaArray {
    fn drop(&mut self) {
        unsafe {
            dealloc_buffer(self.data, self.capacity, self.element_size);
        }
        // Poison the header so a stale pointer to a freed array trips the
        // bounds check instead of reading freed storage.
        #[cfg(any(debug_assertions, feature = "debug_runtime"))]
        {
            self.data = ptr::null_mut();
            self.length = 0;
            self.capacity = 0;
        }
    }
}

/// Create a new array for elements of `element_size` bytes.
///
/// A zero `initial_capacity` falls back to the default minimum. Allocation
/// failure terminates the process.
#[unsafe(no_mangle)]
pub extern "C" fn vela_array_new(element_size: usize, initial_capacity: usize) -> *mut VelaArray {
    match VelaArray::with_capacity(element_size, initial_capacity) {
        Ok(array) => Box::into_raw(Box::new(array)),
        Err(err) => fatal(err),
    }
}

/// Free an array and its backing storage. Null is a no-op.
///
/// # Safety
/// `array` must be null or a live pointer from `vela_array_new`,
/// `vela_array_slice`, or `vela_array_concat`; it must not be used again
/// afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_array_free(array: *mut VelaArray) {
    if !array.is_null() {
        drop(unsafe { Box::from_raw(array) });
    }
}

/// Append one element, growing the storage when full.
///
/// # Safety
/// `array` must be a live array pointer and `element` must point at
/// `element_size` readable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_array_push(array: *mut VelaArray, element: *const u8) {
    let array = match unsafe { array.as_mut() } {
        Some(array) => array,
        None => die("attempted to push to a null array"),
    };
    let bytes: &[u8] = if array.element_size == 0 {
        &[]
    } else if element.is_null() {
        die("attempted to push a null element")
    } else {
        unsafe { slice::from_raw_parts(element, array.element_size) }
    };
    if let Err(err) = array.push(bytes) {
        fatal(err);
    }
}

/// Pointer to the element at `index`. Out-of-bounds access terminates the
/// process.
///
/// The pointer aliases the array's storage and is invalidated by any push
/// that reallocates; callers must not retain it across a mutating call.
///
/// # Safety
/// `array` must be a live array pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_array_get(array: *mut VelaArray, index: usize) -> *mut u8 {
    let array = match unsafe { array.as_ref() } {
        Some(array) => array,
        None => die("attempted to index a null array"),
    };
    match array.get(index) {
        Ok(bytes) => bytes.as_ptr() as *mut u8,
        Err(err) => fatal(err),
    }
}

/// New array copying elements `[start, end)` of `array`. An invalid range
/// terminates the process.
///
/// # Safety
/// `array` must be a live array pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_array_slice(
    array: *mut VelaArray,
    start: usize,
    end: usize,
) -> *mut VelaArray {
    let array = match unsafe { array.as_ref() } {
        Some(array) => array,
        None => die("attempted to slice a null array"),
    };
    match array.slice(start, end) {
        Ok(out) => Box::into_raw(Box::new(out)),
        Err(err) => fatal(err),
    }
}

/// New array holding `a`'s elements followed by `b`'s. Mismatched element
/// widths terminate the process.
///
/// # Safety
/// `a` and `b` must be live array pointers.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_array_concat(a: *mut VelaArray, b: *mut VelaArray) -> *mut VelaArray {
    let (a, b) = match (unsafe { a.as_ref() }, unsafe { b.as_ref() }) {
        (Some(a), Some(b)) => (a, b),
        _ => die("attempted to concat a null array"),
    };
    match a.concat(b) {
        Ok(out) => Box::into_raw(Box::new(out)),
        Err(err) => fatal(err),
    }
}

/// Number of live elements. Null yields zero.
///
/// # Safety
/// `array` must be null or a live array pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vela_array_len(array: *mut VelaArray) -> usize {
    match unsafe { array.as_ref() } {
        Some(array) => array.len(),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_i32(array: &mut VelaArray, value: i32) {
        array.push(&value.to_ne_bytes()).unwrap();
    }

    fn get_i32(array: &VelaArray, index: usize) -> i32 {
        let bytes = array.get(index).unwrap();
        i32::from_ne_bytes(bytes.try_into().unwrap())
    }

    #[test]
    fn zero_capacity_falls_back_to_default() {
        let array = VelaArray::with_capacity(4, 0).unwrap();
        assert_eq!(array.capacity(), DEFAULT_CAPACITY);
        assert_eq!(array.len(), 0);
        assert!(array.is_empty());
        assert_eq!(array.element_size(), 4);
    }

    #[test]
    fn push_preserves_all_elements_across_growth() {
        let mut array = VelaArray::with_capacity(4, 1).unwrap();
        for i in 0..100 {
            push_i32(&mut array, i);
        }
        assert_eq!(array.len(), 100);
        // Doubling from 1: 1, 2, 4, ..., 128.
        assert_eq!(array.capacity(), 128);
        for i in 0..100 {
            assert_eq!(get_i32(&array, i as usize), i);
        }
    }

    #[test]
    fn capacity_only_doubles_when_full() {
        let mut array = VelaArray::with_capacity(8, 2).unwrap();
        let mut seen = vec![array.capacity()];
        for i in 0..40i64 {
            array.push(&i.to_ne_bytes()).unwrap();
            if *seen.last().unwrap() != array.capacity() {
                seen.push(array.capacity());
            }
        }
        assert_eq!(seen, vec![2, 4, 8, 16, 32, 64]);
    }

    #[test]
    fn get_past_length_is_out_of_bounds() {
        let mut array = VelaArray::with_capacity(4, 4).unwrap();
        push_i32(&mut array, 7);
        assert_eq!(get_i32(&array, 0), 7);
        assert_eq!(
            array.get(1),
            Err(RuntimeError::IndexOutOfBounds { index: 1, length: 1 })
        );
        assert_eq!(
            array.get(usize::MAX),
            Err(RuntimeError::IndexOutOfBounds {
                index: usize::MAX,
                length: 1
            })
        );
    }

    #[test]
    fn slice_copies_the_requested_range() {
        let mut array = VelaArray::with_capacity(4, 0).unwrap();
        for i in 10..20 {
            push_i32(&mut array, i);
        }
        let sliced = array.slice(2, 6).unwrap();
        assert_eq!(sliced.len(), 4);
        assert_eq!(sliced.capacity(), 4);
        assert_eq!(sliced.element_size(), 4);
        for k in 0..4 {
            assert_eq!(get_i32(&sliced, k), get_i32(&array, 2 + k));
        }
        // The source is untouched.
        assert_eq!(array.len(), 10);
        assert_eq!(get_i32(&array, 0), 10);
    }

    #[test]
    fn empty_slice_is_legal() {
        let mut array = VelaArray::with_capacity(4, 0).unwrap();
        push_i32(&mut array, 1);
        let sliced = array.slice(1, 1).unwrap();
        assert_eq!(sliced.len(), 0);
        assert!(sliced.is_empty());
    }

    #[test]
    fn slice_rejects_invalid_ranges() {
        let mut array = VelaArray::with_capacity(4, 0).unwrap();
        for i in 0..3 {
            push_i32(&mut array, i);
        }
        assert_eq!(
            array.slice(2, 1),
            Err(RuntimeError::InvalidSliceRange { start: 2, end: 1, length: 3 })
        );
        assert_eq!(
            array.slice(0, 4),
            Err(RuntimeError::InvalidSliceRange { start: 0, end: 4, length: 3 })
        );
        assert_eq!(
            array.slice(5, 6),
            Err(RuntimeError::InvalidSliceRange { start: 5, end: 6, length: 3 })
        );
    }

    #[test]
    fn concat_appends_in_order() {
        let mut a = VelaArray::with_capacity(4, 0).unwrap();
        let mut b = VelaArray::with_capacity(4, 0).unwrap();
        for i in 0..3 {
            push_i32(&mut a, i);
        }
        for i in 3..5 {
            push_i32(&mut b, i);
        }
        let joined = a.concat(&b).unwrap();
        assert_eq!(joined.len(), 5);
        assert_eq!(joined.capacity(), 5);
        for i in 0..5 {
            assert_eq!(get_i32(&joined, i as usize), i as i32);
        }
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn concat_rejects_mismatched_element_sizes() {
        let a = VelaArray::with_capacity(4, 0).unwrap();
        let b = VelaArray::with_capacity(8, 0).unwrap();
        assert_eq!(
            a.concat(&b),
            Err(RuntimeError::ElementSizeMismatch { left: 4, right: 8 })
        );
    }

    #[test]
    fn slice_result_is_independent_of_the_source() {
        let mut array = VelaArray::with_capacity(4, 0).unwrap();
        for i in 0..4 {
            push_i32(&mut array, i);
        }
        let mut sliced = array.slice(0, 2).unwrap();
        push_i32(&mut sliced, 99);
        push_i32(&mut sliced, 100);
        assert_eq!(sliced.len(), 4);
        assert_eq!(array.len(), 4);
        assert_eq!(get_i32(&array, 2), 2);
        assert_eq!(get_i32(&array, 3), 3);
    }

    #[test]
    fn zero_width_elements_only_track_length() {
        let mut array = VelaArray::with_capacity(0, 0).unwrap();
        for _ in 0..50 {
            array.push(&[]).unwrap();
        }
        assert_eq!(array.len(), 50);
        assert_eq!(array.get(49).unwrap(), &[] as &[u8]);
        let sliced = array.slice(10, 30).unwrap();
        assert_eq!(sliced.len(), 20);
    }
}
