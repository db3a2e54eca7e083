// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt::Debug;
use std::ops::{Index, IndexMut};

/// Square matrix stored in row-major order, indexed by `(row, col)`.
#[derive(Clone, PartialEq, Eq)]
pub struct Matrix<T> {
    dim: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Matrix<T> {
    pub fn new(dim: usize) -> Matrix<T> {
        Matrix {
            dim,
            data: vec![T::default(); dim * dim],
        }
    }
}

impl<T> Matrix<T> {
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row(&self, row: usize) -> &[T] {
        let start = row * self.dim;
        &self.data[start..start + self.dim]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.data.chunks_exact(self.dim.max(1))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        debug_assert!(row < self.dim && col < self.dim);
        &self.data[row * self.dim + col]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        debug_assert!(row < self.dim && col < self.dim);
        &mut self.data[row * self.dim + col]
    }
}

impl<T: Debug> Debug for Matrix<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Matrix {}x{} ", self.dim, self.dim)?;
        f.debug_list().entries(self.rows()).finish()
    }
}
