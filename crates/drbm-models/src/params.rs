//! Parameter storage shared by the model, its gradients, and optimizer state.
//!
//! Every buffer that mirrors the model's biases and weights is a [`ParamSet`],
//! so shapes are fixed once from a [`Topology`] and addressed by
//! [`ParamGroup`] plus a flat index.

use drbm_core::{DrbmError, DrbmResult, Topology};
use std::ops::{Index, IndexMut};

/// One of the four trainable parameter groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamGroup {
    /// Hidden-unit biases, length `hsize`
    BiasH,
    /// Label biases, length `ysize`
    BiasY,
    /// Input-to-hidden couplings, `xsize × hsize`
    WeightXH,
    /// Hidden-to-label couplings, `hsize × ysize`
    WeightHY,
}

impl ParamGroup {
    /// Groups in update order.
    pub const ALL: [ParamGroup; 4] = [
        ParamGroup::WeightXH,
        ParamGroup::BiasH,
        ParamGroup::WeightHY,
        ParamGroup::BiasY,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ParamGroup::BiasH => "h",
            ParamGroup::BiasY => "y",
            ParamGroup::WeightXH => "xh",
            ParamGroup::WeightHY => "hy",
        }
    }

    /// `(rows, cols)`; bias vectors are a single row.
    pub fn shape(&self, topology: &Topology) -> (usize, usize) {
        let (x, h, y) = (topology.xsize(), topology.hsize(), topology.ysize());
        match self {
            ParamGroup::BiasH => (1, h),
            ParamGroup::BiasY => (1, y),
            ParamGroup::WeightXH => (x, h),
            ParamGroup::WeightHY => (h, y),
        }
    }
}

/// Dense row-major matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from nested rows; every row must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> DrbmResult<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            if row.len() != n_cols {
                return Err(DrbmError::invalid_dimension(
                    "Matrix::from_rows",
                    n_cols,
                    row.len(),
                ));
            }
            data.extend_from_slice(row);
        }
        Ok(Matrix {
            rows: n_rows,
            cols: n_cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn flat_index(&self, i: usize, j: usize) -> usize {
        i * self.cols + j
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;
    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[i * self.cols + j]
    }
}

/// Writable view of a [`Matrix`] owned by a [`ParamSet`].
///
/// Values can be overwritten but the shape cannot change.
#[derive(Debug)]
pub struct MatrixMut<'a> {
    rows: usize,
    cols: usize,
    data: &'a mut [f64],
}

impl<'a> MatrixMut<'a> {
    fn new(matrix: &'a mut Matrix) -> Self {
        MatrixMut {
            rows: matrix.rows,
            cols: matrix.cols,
            data: &mut matrix.data,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut *self.data
    }

    /// Overwrite every value from `source`, which must have the same shape.
    pub fn copy_from(&mut self, source: &Matrix) -> DrbmResult<()> {
        if source.rows != self.rows {
            return Err(DrbmError::invalid_dimension("matrix rows", self.rows, source.rows));
        }
        if source.cols != self.cols {
            return Err(DrbmError::invalid_dimension("matrix cols", self.cols, source.cols));
        }
        self.data.copy_from_slice(&source.data);
        Ok(())
    }
}

impl Index<(usize, usize)> for MatrixMut<'_> {
    type Output = f64;
    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for MatrixMut<'_> {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[i * self.cols + j]
    }
}

/// Biases and weights of one DRBM, or any buffer shaped like them.
///
/// Storage is private: once built, a set can only be written through
/// fixed-length views, so its shape never drifts from the one it was
/// created with.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSet {
    bias_h: Vec<f64>,
    bias_y: Vec<f64>,
    /// `weight_xh[(i, j)]` couples input `i` to hidden unit `j`
    weight_xh: Matrix,
    /// `weight_hy[(j, k)]` couples hidden unit `j` to label `k`
    weight_hy: Matrix,
}

impl ParamSet {
    /// Assemble a set from its parts. Shapes are checked against a topology
    /// when the set is handed to a model ([`check_shape`](Self::check_shape)).
    pub fn new(bias_h: Vec<f64>, bias_y: Vec<f64>, weight_xh: Matrix, weight_hy: Matrix) -> Self {
        ParamSet {
            bias_h,
            bias_y,
            weight_xh,
            weight_hy,
        }
    }

    pub fn zeros(topology: &Topology) -> Self {
        let (x, h, y) = (topology.xsize(), topology.hsize(), topology.ysize());
        ParamSet {
            bias_h: vec![0.0; h],
            bias_y: vec![0.0; y],
            weight_xh: Matrix::zeros(x, h),
            weight_hy: Matrix::zeros(h, y),
        }
    }

    pub fn bias_h(&self) -> &[f64] {
        &self.bias_h
    }

    pub fn bias_y(&self) -> &[f64] {
        &self.bias_y
    }

    pub fn weight_xh(&self) -> &Matrix {
        &self.weight_xh
    }

    pub fn weight_hy(&self) -> &Matrix {
        &self.weight_hy
    }

    pub fn bias_h_mut(&mut self) -> &mut [f64] {
        &mut self.bias_h
    }

    pub fn bias_y_mut(&mut self) -> &mut [f64] {
        &mut self.bias_y
    }

    pub fn weight_xh_mut(&mut self) -> MatrixMut<'_> {
        MatrixMut::new(&mut self.weight_xh)
    }

    pub fn weight_hy_mut(&mut self) -> MatrixMut<'_> {
        MatrixMut::new(&mut self.weight_hy)
    }

    /// Flat view of one group (row-major for the weight matrices).
    pub fn group(&self, group: ParamGroup) -> &[f64] {
        match group {
            ParamGroup::BiasH => &self.bias_h,
            ParamGroup::BiasY => &self.bias_y,
            ParamGroup::WeightXH => self.weight_xh.as_slice(),
            ParamGroup::WeightHY => self.weight_hy.as_slice(),
        }
    }

    pub fn group_mut(&mut self, group: ParamGroup) -> &mut [f64] {
        match group {
            ParamGroup::BiasH => &mut self.bias_h,
            ParamGroup::BiasY => &mut self.bias_y,
            ParamGroup::WeightXH => self.weight_xh.as_mut_slice(),
            ParamGroup::WeightHY => self.weight_hy.as_mut_slice(),
        }
    }

    /// Fail with `InvalidDimension` unless every group matches `topology`.
    pub fn check_shape(&self, topology: &Topology) -> DrbmResult<()> {
        let (x, h, y) = (topology.xsize(), topology.hsize(), topology.ysize());
        let checks = [
            ("bias_h", h, self.bias_h.len()),
            ("bias_y", y, self.bias_y.len()),
            ("weight_xh rows", x, self.weight_xh.rows()),
            ("weight_xh cols", h, self.weight_xh.cols()),
            ("weight_hy rows", h, self.weight_hy.rows()),
            ("weight_hy cols", y, self.weight_hy.cols()),
        ];
        for (context, expected, got) in checks {
            if expected != got {
                return Err(DrbmError::invalid_dimension(context, expected, got));
            }
        }
        Ok(())
    }

    pub fn fill(&mut self, value: f64) {
        for group in ParamGroup::ALL {
            self.group_mut(group).fill(value);
        }
    }

    /// Largest absolute entry over all groups (0.0 when empty).
    pub fn max_abs(&self) -> f64 {
        ParamGroup::ALL
            .iter()
            .flat_map(|&g| self.group(g).iter())
            .fold(0.0, |acc: f64, v| acc.max(v.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_match_topology() {
        let topo = Topology::new(3, 2, 4).unwrap();
        let params = ParamSet::zeros(&topo);
        assert!(params.check_shape(&topo).is_ok());
        for group in ParamGroup::ALL {
            let (r, c) = group.shape(&topo);
            assert_eq!(params.group(group).len(), r * c, "group {}", group.name());
        }
    }

    #[test]
    fn test_matrix_indexing_is_row_major() {
        let mut m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert_eq!(m[(2, 1)], 6.0);
        assert_eq!(m.flat_index(1, 0), 2);
        m[(0, 1)] = -2.0;
        assert_eq!(m.row(0), &[1.0, -2.0]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, DrbmError::InvalidDimension { expected: 2, got: 1, .. }));
    }

    #[test]
    fn test_check_shape_detects_mismatch() {
        let topo = Topology::new(2, 2, 2).unwrap();
        let params = ParamSet::new(
            vec![0.0; 2],
            vec![0.0; 3],
            Matrix::zeros(2, 2),
            Matrix::zeros(2, 2),
        );
        assert!(matches!(
            params.check_shape(&topo),
            Err(DrbmError::InvalidDimension { expected: 2, got: 3, .. })
        ));
    }

    #[test]
    fn test_matrix_view_writes_values_but_keeps_shape() {
        let topo = Topology::new(2, 2, 2).unwrap();
        let mut params = ParamSet::zeros(&topo);
        {
            let mut w = params.weight_xh_mut();
            w[(1, 0)] = 3.0;
            assert_eq!((w.rows(), w.cols()), (2, 2));
        }
        assert_eq!(params.weight_xh()[(1, 0)], 3.0);

        let wide = Matrix::zeros(2, 3);
        let err = params.weight_xh_mut().copy_from(&wide).unwrap_err();
        assert!(matches!(err, DrbmError::InvalidDimension { expected: 2, got: 3, .. }));
        assert!(params.check_shape(&topo).is_ok());
        assert_eq!(params.weight_xh()[(1, 0)], 3.0);

        let replacement = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        params.weight_xh_mut().copy_from(&replacement).unwrap();
        assert_eq!(params.weight_xh(), &replacement);
    }
}
