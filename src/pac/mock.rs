//! In-memory register backend for host-side tests.

use heapless::Vec;

use super::RegisterAccess;

/// A flat register file of `N` words with a journal of every write.
///
/// The journal lets tests assert not only final register contents but also
/// that a failed operation performed no writes at all.
pub struct MockRegs<const N: usize = 32> {
    words: [u32; N],
    writes: Vec<(usize, u32), 256>,
}

impl<const N: usize> MockRegs<N> {
    pub fn new() -> Self {
        Self {
            words: [0; N],
            writes: Vec::new(),
        }
    }

    /// Back-door register load that does not appear in the journal; used to
    /// model hardware-driven state such as status flags and captured values.
    pub fn load(&mut self, offset: usize, value: u32) {
        self.words[offset / 4] = value;
    }

    /// Back-door read without going through the access trait.
    pub fn get(&self, offset: usize) -> u32 {
        self.words[offset / 4]
    }

    /// Number of writes the driver has performed so far.
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    /// Writes performed against `offset`, in order.
    pub fn writes_to(&self, offset: usize) -> impl Iterator<Item = u32> + '_ {
        self.writes
            .iter()
            .filter(move |(o, _)| *o == offset)
            .map(|(_, v)| *v)
    }
}

impl<const N: usize> Default for MockRegs<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RegisterAccess for MockRegs<N> {
    fn read(&self, offset: usize) -> u32 {
        self.words[offset / 4]
    }

    fn write(&mut self, offset: usize, value: u32) {
        self.words[offset / 4] = value;
        // Journal overflow would silently drop history; fail loudly instead.
        self.writes
            .push((offset, value))
            .expect("mock write journal full");
    }
}
