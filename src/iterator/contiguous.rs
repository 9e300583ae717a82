use crate::{iterator::IndexIterator, shape::Shape};

/// Linear scan over `offset..offset + len` for datasets with default strides.
#[derive(Debug, Clone)]
pub struct ContiguousIterator {
    shape: Shape,
    next: usize,
    end: usize,
    index: usize,
}

impl ContiguousIterator {
    pub fn new(shape: &[usize], offset: usize) -> Self {
        let len: usize = shape.iter().product();
        Self {
            shape: Shape::from_slice(shape),
            next: offset,
            end: offset + len,
            index: offset,
        }
    }
}

impl IndexIterator for ContiguousIterator {
    fn advance(&mut self) -> bool {
        if self.next >= self.end {
            return false;
        }
        self.index = self.next;
        self.next += 1;
        true
    }

    fn index(&self) -> usize {
        self.index
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterator::collect_indices;

    #[test]
    fn walks_offset_range() {
        let mut it = ContiguousIterator::new(&[2, 2], 3);
        assert_eq!(collect_indices(&mut it).unwrap(), vec![3, 4, 5, 6]);
        assert!(!it.advance());
    }

    #[test]
    fn empty_shape_is_exhausted_immediately() {
        let mut it = ContiguousIterator::new(&[3, 0], 0);
        assert!(!it.advance());
    }

    #[test]
    fn rank_zero_yields_one_element() {
        let mut it = ContiguousIterator::new(&[], 0);
        assert!(it.advance());
        assert_eq!(it.index(), 0);
        assert!(!it.advance());
    }
}
