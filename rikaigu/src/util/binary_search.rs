/*
 * Copyright (c) 2021 Works Applications Co., Ltd.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Sorted sequence search.
//!
//! Both functions take the number of elements and a comparator which orders
//! the element at a given index against the needle, so they work equally over
//! slices, records stored in arena buffers, or rule tables.

use std::cmp::Ordering;
use std::ops::Range;

/// Finds the leftmost position where the needle is or could be inserted.
///
/// `cmp(i)` must return the ordering of element `i` relative to the needle.
/// Returns the position and whether the element there is equal to the needle.
pub fn binary_locate<F>(count: usize, mut cmp: F) -> (usize, bool)
where
    F: FnMut(usize) -> Ordering,
{
    let lower = lower_bound(count, &mut cmp);
    let found = lower < count && cmp(lower) == Ordering::Equal;
    (lower, found)
}

/// Finds the range of elements equal to the needle.
///
/// The range is empty on a miss and starts at the insertion point either way.
pub fn binary_locate_bounds<F>(count: usize, mut cmp: F) -> Range<usize>
where
    F: FnMut(usize) -> Ordering,
{
    let lower = lower_bound(count, &mut cmp);
    let mut low = lower;
    let mut high = count;
    while low < high {
        let mid = low + (high - low) / 2;
        if cmp(mid) == Ordering::Greater {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    lower..low
}

fn lower_bound<F>(count: usize, cmp: &mut F) -> usize
where
    F: FnMut(usize) -> Ordering,
{
    let mut low = 0;
    let mut high = count;
    while low < high {
        let mid = low + (high - low) / 2;
        if cmp(mid) == Ordering::Less {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    low
}

/// [`binary_locate`] over a slice, comparing elements with `f`
#[inline]
pub fn locate_in<T, F>(items: &[T], mut f: F) -> (usize, bool)
where
    F: FnMut(&T) -> Ordering,
{
    binary_locate(items.len(), |i| f(&items[i]))
}
