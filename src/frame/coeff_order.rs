// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

use crate::util::tracing_wrappers::*;

/// Zig-zag scan order of a `dim` x `dim` block, as `(row, col)` pairs.
///
/// Anti-diagonals are walked in turn; even ones go from the bottom-left end
/// up to the top-right, odd ones the other way round.
/// ```
/// # use jpeg_coeffs::frame::coeff_order::zigzag_order;
/// assert_eq!(zigzag_order(2), vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
/// ```
pub fn zigzag_order(dim: usize) -> Vec<(usize, usize)> {
    let mut out = Vec::with_capacity(dim * dim);
    if dim == 0 {
        return out;
    }
    for i in 0..(2 * dim - 1) {
        for j in 0..(i + 1) {
            let mut row = i - j;
            let mut col = j;
            if i % 2 != 0 {
                mem::swap(&mut row, &mut col);
            }
            if row < dim && col < dim {
                out.push((row, col));
            }
        }
    }
    out
}

/// Zig-zag orders for every block dimension used by a decode session,
/// computed on first use.
#[derive(Debug, Default)]
pub struct ZigZagIndexer {
    orders: HashMap<usize, Rc<[(usize, usize)]>>,
}

impl ZigZagIndexer {
    pub fn new() -> ZigZagIndexer {
        ZigZagIndexer::default()
    }

    pub fn indices_for(&mut self, dim: usize) -> Rc<[(usize, usize)]> {
        self.orders
            .entry(dim)
            .or_insert_with(|| {
                trace!(dim, "computing zig-zag order");
                zigzag_order(dim).into()
            })
            .clone()
    }
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;

    // Table K.5 layout: position of each natural-order index in zig-zag order.
    const JPEG_ZIGZAG: [usize; 64] = [
        0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34,
        27, 20, 13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44,
        51, 58, 59, 52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
    ];

    #[test]
    fn standard_8x8_order() {
        let order = zigzag_order(8);
        assert_eq!(order.len(), 64);
        assert_eq!(order[0], (0, 0));
        assert_eq!(order[1], (0, 1));
        assert_eq!(order[2], (1, 0));
        assert_eq!(order[63], (7, 7));
        let natural: Vec<usize> = order.iter().map(|&(row, col)| row * 8 + col).collect();
        assert_eq!(natural, JPEG_ZIGZAG);
    }

    #[test]
    fn covers_every_cell_once() {
        arbtest::arbtest(|u| {
            let dim = u.int_in_range(1..=32)?;
            let order = zigzag_order(dim);
            assert_eq!(order.len(), dim * dim);
            let mut seen = vec![false; dim * dim];
            for &(row, col) in &order {
                assert!(row < dim && col < dim);
                assert!(!seen[row * dim + col]);
                seen[row * dim + col] = true;
            }
            assert_eq!(order[0], (0, 0));
            assert_eq!(order[dim * dim - 1], (dim - 1, dim - 1));
            Ok(())
        });
    }

    #[test]
    fn indexer_caches_per_dimension() {
        let mut indexer = ZigZagIndexer::new();
        let first = indexer.indices_for(8);
        let again = indexer.indices_for(8);
        assert!(Rc::ptr_eq(&first, &again));
        assert_eq!(indexer.indices_for(4).len(), 16);
        assert!(zigzag_order(0).is_empty());
    }
}
