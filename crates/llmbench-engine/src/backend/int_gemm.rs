//! Widened-integer matrices and their CPU matmul.

use crate::precision::IntRange;
use llmbench_common::{BenchError, Device, Result};
use rand::Rng;
use rayon::prelude::*;

/// Row-major `i32` matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntMatrix {
    data: Vec<i32>,
    rows: usize,
    cols: usize,
}

impl IntMatrix {
    /// Widen narrow values to `i32`.
    pub fn widen(values: &[i8], rows: usize, cols: usize) -> Result<Self> {
        if values.len() != rows * cols {
            return Err(BenchError::InvalidProfile(format!(
                "expected {} values for a {rows}x{cols} matrix, got {}",
                rows * cols,
                values.len()
            )));
        }
        Ok(Self { data: values.iter().map(|&v| i32::from(v)).collect(), rows, cols })
    }

    /// `size×size` matrix drawn uniformly from `range`, stored as `i8` then widened.
    pub fn random<R: Rng + ?Sized>(size: usize, range: IntRange, rng: &mut R) -> Result<Self> {
        let narrow: Vec<i8> =
            (0..size * size).map(|_| rng.gen_range(range.low..=range.high)).collect();
        Self::widen(&narrow, size, size)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `self × rhs`, rows partitioned across the rayon pool.
    ///
    /// Accumulates with wrapping arithmetic; the simulated ranges cannot
    /// overflow `i32` for any practical dimension.
    pub fn matmul(&self, rhs: &Self) -> Result<Self> {
        if self.cols != rhs.rows {
            return Err(BenchError::Unsupported {
                device: Device::Cpu,
                operation: format!(
                    "matmul of {}x{} by {}x{}",
                    self.rows, self.cols, rhs.rows, rhs.cols
                ),
            });
        }
        let (k, n) = (self.cols, rhs.cols);
        let mut out = vec![0i32; self.rows * n];
        if n > 0 {
            out.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
                let a_row = &self.data[i * k..(i + 1) * k];
                for (l, &a) in a_row.iter().enumerate() {
                    let b_row = &rhs.data[l * n..(l + 1) * n];
                    for (c, &b) in row.iter_mut().zip(b_row) {
                        *c = c.wrapping_add(a.wrapping_mul(b));
                    }
                }
            });
        }
        Ok(Self { data: out, rows: self.rows, cols: n })
    }
}
