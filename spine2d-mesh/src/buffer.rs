/// Grow-only scratch storage reused across frames.
///
/// `prepare` hands out a slice of the requested length, reallocating only when
/// the current allocation is too small. Growth rounds up to a power of two so
/// a slowly growing mesh does not reallocate every frame.
#[derive(Clone, Debug, Default)]
pub struct ScratchBuffer<T> {
    data: Vec<T>,
    len: usize,
    grow_count: usize,
}

const MIN_CAPACITY: usize = 16;

impl<T: Copy + Default> ScratchBuffer<T> {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            len: 0,
            grow_count: 0,
        }
    }

    /// Returns a slice of exactly `len` elements. Contents left over from a
    /// previous use are not cleared.
    pub fn prepare(&mut self, len: usize) -> &mut [T] {
        if len > self.data.len() {
            let capacity = len.next_power_of_two().max(MIN_CAPACITY);
            self.data.resize(capacity, T::default());
            self.grow_count += 1;
        }
        self.len = len;
        &mut self.data[..len]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of reallocations so far.
    pub fn grow_count(&self) -> usize {
        self.grow_count
    }
}
