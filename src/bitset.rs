//! A dense set of vertex ids of fixed size.
//!
//! Thin wrapper around `stream_bitset`'s `BitSetImpl` that takes `usize` ids and checks every
//! access against the size of the id space.

use std::fmt;
use stream_bitset::bitset::BitSetImpl;

type Bits = BitSetImpl<u32>;

#[derive(Clone)]
pub struct BitSet {
    num_bits: usize,
    bits: Bits,
}

impl BitSet {

    /// Creates an empty set over the ids `0..num_bits`.
    pub fn new(num_bits: usize) -> Self {
        BitSet {
            num_bits,
            bits: Bits::new(Self::index(num_bits)),
        }
    }

    /// Creates a set over `0..num_bits` containing every id.
    pub fn full(num_bits: usize) -> Self {
        BitSet {
            num_bits,
            bits: Bits::new_all_set(Self::index(num_bits)),
        }
    }

    /// Creates a set over `0..num_bits` containing the ids in `bits`.
    pub fn from_bits<I: IntoIterator<Item=usize>>(num_bits: usize, bits: I) -> Self {
        let mut set = Self::new(num_bits);
        for bit in bits {
            set.set(bit);
        }
        set
    }

    fn index(bit: usize) -> u32 {
        u32::try_from(bit).expect("vertex ids fit into 32 bits")
    }

    fn check(&self, bit: usize) {
        assert!(bit < self.num_bits, "bit {} out of range {}", bit, self.num_bits);
    }

    /// Returns the size of the id space, not the number of members.
    pub fn len(&self) -> usize {
        self.num_bits
    }

    pub fn get(&self, bit: usize) -> bool {
        self.check(bit);
        self.bits.get_bit(bit as u32)
    }

    pub fn set(&mut self, bit: usize) {
        self.check(bit);
        self.bits.set_bit(bit as u32);
    }

    pub fn unset(&mut self, bit: usize) {
        self.check(bit);
        self.bits.clear_bit(bit as u32);
    }

    pub fn toggle(&mut self, bit: usize) {
        let value = self.get(bit);
        self.put(bit, !value);
    }

    /// Sets `bit` to `value`.
    pub fn put(&mut self, bit: usize, value: bool) {
        if value {
            self.set(bit);
        } else {
            self.unset(bit);
        }
    }

    /// Returns the smallest member that is at least `from`.
    pub fn find(&self, from: usize) -> Option<usize> {
        if from >= self.num_bits {
            return None
        }
        self.bits
            .get_first_set_index_atleast(from as u32)
            .map(|bit| bit as usize)
            .filter(|bit| *bit < self.num_bits)
    }

    /// Returns the number of members.
    pub fn count(&self) -> usize {
        self.bits.cardinality() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Overwrites `self` with the members of `other`.
    pub fn copy_from(&mut self, other: &BitSet) {
        assert_eq!(self.num_bits, other.num_bits, "bit sets differ in size");
        self.bits.clone_from(&other.bits);
    }

    pub fn clear(&mut self) {
        self.bits.clear_all();
    }

    pub fn fill(&mut self) {
        self.bits = Bits::new_all_set(Self::index(self.num_bits));
    }

    pub fn invert(&mut self) {
        let members = self.bits.clone();
        self.bits = Bits::new_with_bits_set(
            Self::index(self.num_bits),
            (0..self.num_bits as u32).filter(|bit| !members.get_bit(*bit)));
    }

    /// Removes all members of `other` from `self`.
    pub fn set_minus(&mut self, other: &BitSet) {
        assert_eq!(self.num_bits, other.num_bits, "bit sets differ in size");
        for bit in other.bits.iter_set_bits() {
            self.bits.clear_bit(bit);
        }
    }

    /// Adds all members of `other` to `self`.
    pub fn join(&mut self, other: &BitSet) {
        assert_eq!(self.num_bits, other.num_bits, "bit sets differ in size");
        for bit in other.bits.iter_set_bits() {
            self.bits.set_bit(bit);
        }
    }

    /// Returns an `Iterator` over the members in increasing order.
    pub fn iter(&self) -> impl Iterator<Item=usize> + '_ {
        self.bits.iter_set_bits().map(|bit| bit as usize)
    }
}

impl PartialEq for BitSet {
    fn eq(&self, other: &Self) -> bool {
        self.num_bits == other.num_bits && self.iter().eq(other.iter())
    }
}

impl Eq for BitSet {}

impl fmt::Display for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}:", self.count(), self.num_bits)?;
        for bit in self.iter() {
            write!(f, " {}", bit)?;
        }
        write!(f, "]")
    }
}

impl fmt::Debug for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_test() {
        let mut set = BitSet::new(130);
        set.set(0);
        set.set(64);
        set.set(129);
        assert!(set.get(0) && set.get(64) && set.get(129));
        assert!(!set.get(1));
        set.toggle(64);
        assert!(!set.get(64));
        set.put(5, true);
        set.put(0, false);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![5, 129]);
        assert_eq!(set.count(), 2);
    }

    #[test]
    fn find_test() {
        let set = BitSet::from_bits(200, vec![3, 63, 64, 190]);
        assert_eq!(set.find(0), Some(3));
        assert_eq!(set.find(4), Some(63));
        assert_eq!(set.find(64), Some(64));
        assert_eq!(set.find(65), Some(190));
        assert_eq!(set.find(191), None);
        assert_eq!(set.find(500), None);
        assert_eq!(BitSet::new(0).find(0), None);
    }

    #[test]
    fn invert_test() {
        let mut set = BitSet::new(70);
        set.invert();
        assert_eq!(set.count(), 70);
        assert_eq!(set.find(69), Some(69));
        set.unset(10);
        set.invert();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![10]);
        assert_eq!(BitSet::full(65).count(), 65);
        let mut full = BitSet::full(65);
        full.invert();
        assert!(full.is_empty());
    }

    #[test]
    fn set_operations_test() {
        let mut a = BitSet::from_bits(10, vec![1, 2, 3, 7]);
        let b = BitSet::from_bits(10, vec![2, 7, 9]);
        a.set_minus(&b);
        assert_eq!(a, BitSet::from_bits(10, vec![1, 3]));
        a.join(&b);
        assert_eq!(a.count(), 5);
        let mut c = BitSet::new(10);
        c.copy_from(&a);
        assert_eq!(c, a);
        c.clear();
        assert!(c.is_empty());
        c.fill();
        assert_eq!(c.count(), 10);
        assert_eq!(format!("{}", b), "[3/10: 2 7 9]");
    }

    #[test]
    #[should_panic]
    fn out_of_range_test() {
        let set = BitSet::new(8);
        set.get(8);
    }

    #[test]
    #[should_panic]
    fn size_mismatch_test() {
        let mut a = BitSet::new(8);
        a.join(&BitSet::new(9));
    }
}
