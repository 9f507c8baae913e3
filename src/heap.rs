//! Array-backed binary heap with the ordering supplied per call.
//!
//! The heap never stores its comparator. Every operation that moves
//! elements takes a `before(a, b)` closure that returns `true` when `a`
//! belongs nearer the root than `b`, so one storage can be ordered by
//! frequency for tree building and later sorted by symbol value.

#[derive(Debug, Clone)]
pub struct Heap<T> {
    items: Vec<T>,
}

impl<T> Heap<T> {
    pub fn new() -> Self {
        Heap { items: Vec::new() }
    }

    /// Heapify `items` in place, O(n).
    pub fn build<F>(items: Vec<T>, before: F) -> Self
    where
        F: Fn(&T, &T) -> bool,
    {
        let mut heap = Heap { items };
        heap.heapify(&before);
        heap
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The element at the root, if any.
    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    /// Remove and return the root, restoring heap order in O(log n).
    ///
    /// `before` must be the ordering the heap was built with.
    pub fn extract_min<F>(&mut self, before: F) -> Option<T>
    where
        F: Fn(&T, &T) -> bool,
    {
        if self.items.is_empty() {
            return None;
        }
        let last = self.items.len() - 1;
        self.items.swap(0, last);
        let top = self.items.pop();
        let end = self.items.len();
        self.sift_down(0, end, &before);
        top
    }

    /// Heap-sort the storage so that it ends up in `before` order.
    ///
    /// The element count is unchanged; afterwards the storage is sorted,
    /// which is also a valid heap for `before`.
    pub fn sort<F>(&mut self, before: F)
    where
        F: Fn(&T, &T) -> bool,
    {
        // Root holds the element that sorts last, so it can be swapped to the end.
        let after = |a: &T, b: &T| before(b, a);
        self.heapify(&after);
        for end in (1..self.items.len()).rev() {
            self.items.swap(0, end);
            self.sift_down(0, end, &after);
        }
    }

    /// Check the heap property for `before`.
    pub fn is_heap<F>(&self, before: F) -> bool
    where
        F: Fn(&T, &T) -> bool,
    {
        (1..self.items.len()).all(|i| !before(&self.items[i], &self.items[(i - 1) / 2]))
    }

    fn heapify<F>(&mut self, before: &F)
    where
        F: Fn(&T, &T) -> bool,
    {
        let end = self.items.len();
        for i in (0..end / 2).rev() {
            self.sift_down(i, end, before);
        }
    }

    fn sift_down<F>(&mut self, mut i: usize, end: usize, before: &F)
    where
        F: Fn(&T, &T) -> bool,
    {
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut first = i;

            if left < end && before(&self.items[left], &self.items[first]) {
                first = left;
            }
            if right < end && before(&self.items[right], &self.items[first]) {
                first = right;
            }
            if first == i {
                return;
            }
            self.items.swap(i, first);
            i = first;
        }
    }
}

impl<T> Default for Heap<T> {
    fn default() -> Self {
        Self::new()
    }
}
