//! Dense grid containers for model fields.
//!
//! `Grid3D` stores one field sampled at every point of a sub-domain as a flat
//! `Vec<f32>` with x varying fastest:
//!
//! ```text
//! index = iz * (ny * nx) + iy * nx + ix
//! ```
//!
//! `Grid2D` is the horizontal counterpart (`index = iy * nx + ix`), used for
//! surface fields and for the output of column-reducing operators.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{FieldError, FieldResult};

/// Number of samples along each axis of a 3D grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape3 {
    /// Samples along x (innermost)
    pub nx: usize,
    /// Samples along y
    pub ny: usize,
    /// Samples along z (outermost, vertical)
    pub nz: usize,
}

impl Shape3 {
    /// Create a shape from physical-order extents
    #[must_use]
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Total number of samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// True if any axis has zero samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples in one horizontal layer
    #[must_use]
    pub fn layer_len(&self) -> usize {
        self.nx * self.ny
    }

    /// Shape of a horizontal layer
    #[must_use]
    pub fn horizontal(&self) -> Shape2 {
        Shape2::new(self.nx, self.ny)
    }
}

impl std::fmt::Display for Shape3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.nx, self.ny, self.nz)
    }
}

/// Number of samples along each axis of a 2D grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape2 {
    /// Samples along x
    pub nx: usize,
    /// Samples along y
    pub ny: usize,
}

impl Shape2 {
    /// Create a shape from physical-order extents
    #[must_use]
    pub fn new(nx: usize, ny: usize) -> Self {
        Self { nx, ny }
    }

    /// Total number of samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// True if any axis has zero samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for Shape2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.nx, self.ny)
    }
}

/// Dense 3D field of f32 samples
#[derive(Debug, Clone, PartialEq)]
pub struct Grid3D {
    data: Vec<f32>,
    shape: Shape3,
}

impl Grid3D {
    /// Create a grid initialized to zero
    #[must_use]
    pub fn new(shape: Shape3) -> Self {
        Self::filled(shape, 0.0)
    }

    /// Create a grid with every sample set to `value`
    #[must_use]
    pub fn filled(shape: Shape3, value: f32) -> Self {
        Self {
            data: vec![value; shape.len()],
            shape,
        }
    }

    /// Wrap an existing buffer laid out in storage order
    ///
    /// # Errors
    /// Returns `LengthMismatch` if `data.len()` differs from `shape.len()`.
    pub fn from_vec(shape: Shape3, data: Vec<f32>) -> FieldResult<Self> {
        if data.len() != shape.len() {
            return Err(FieldError::LengthMismatch {
                expected: shape.len(),
                found: data.len(),
            });
        }
        Ok(Self { data, shape })
    }

    /// Build a grid by evaluating `f(ix, iy, iz)` at every sample
    #[must_use]
    pub fn from_fn<F>(shape: Shape3, f: F) -> Self
    where
        F: Fn(usize, usize, usize) -> f32 + Sync + Send,
    {
        let layer = shape.layer_len().max(1);
        let nx = shape.nx.max(1);
        Self::from_index_fn(shape, |idx| {
            let iz = idx / layer;
            let rem = idx % layer;
            f(rem % nx, rem / nx, iz)
        })
    }

    /// Build a grid by evaluating `f(flat_index)` at every sample in parallel
    #[must_use]
    pub fn from_index_fn<F>(shape: Shape3, f: F) -> Self
    where
        F: Fn(usize) -> f32 + Sync + Send,
    {
        let data = (0..shape.len()).into_par_iter().map(f).collect();
        Self { data, shape }
    }

    /// Grid shape
    #[must_use]
    pub fn shape(&self) -> Shape3 {
        self.shape
    }

    /// Total number of samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the grid holds no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat storage index of a sample
    #[inline]
    #[must_use]
    pub fn index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        iz * self.shape.layer_len() + iy * self.shape.nx + ix
    }

    /// Sample at grid coordinates
    ///
    /// # Panics
    /// Panics if the coordinates are outside the grid.
    #[inline]
    #[must_use]
    pub fn get(&self, ix: usize, iy: usize, iz: usize) -> f32 {
        self.data[self.index(ix, iy, iz)]
    }

    /// Overwrite a sample at grid coordinates
    #[inline]
    pub fn set(&mut self, ix: usize, iy: usize, iz: usize, value: f32) {
        let idx = self.index(ix, iy, iz);
        self.data[idx] = value;
    }

    /// Samples in storage order
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable samples in storage order
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consume the grid and return its buffer
    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Horizontal layer `iz` as a flat slice
    #[must_use]
    pub fn layer(&self, iz: usize) -> &[f32] {
        let len = self.shape.layer_len();
        &self.data[iz * len..(iz + 1) * len]
    }

    /// Horizontal layer `iz` copied into a `Grid2D`
    #[must_use]
    pub fn level(&self, iz: usize) -> Grid2D {
        Grid2D {
            data: self.layer(iz).to_vec(),
            shape: self.shape.horizontal(),
        }
    }

    /// Apply `f` to every sample, producing a new grid
    #[must_use]
    pub fn map<F>(&self, f: F) -> Grid3D
    where
        F: Fn(f32) -> f32 + Sync + Send,
    {
        Grid3D {
            data: self.data.par_iter().map(|&v| f(v)).collect(),
            shape: self.shape,
        }
    }

    /// Combine two grids sample by sample
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if the grids differ in shape.
    pub fn zip_map<F>(&self, other: &Grid3D, operation: &'static str, f: F) -> FieldResult<Grid3D>
    where
        F: Fn(f32, f32) -> f32 + Sync + Send,
    {
        self.ensure_same_shape(other, operation)?;
        Ok(Grid3D {
            data: self
                .data
                .par_iter()
                .zip(other.data.par_iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
            shape: self.shape,
        })
    }

    /// Check that `other` has the same shape as `self`
    ///
    /// # Errors
    /// Returns `ShapeMismatch` naming `operation` if the shapes differ.
    pub fn ensure_same_shape(&self, other: &Grid3D, operation: &'static str) -> FieldResult<()> {
        if self.shape == other.shape {
            Ok(())
        } else {
            Err(FieldError::ShapeMismatch {
                operation,
                expected: self.shape.to_string(),
                found: other.shape.to_string(),
            })
        }
    }

    /// Check that a 2D field covers this grid's horizontal layer
    ///
    /// # Errors
    /// Returns `ShapeMismatch` naming `operation` if the shapes differ.
    pub fn ensure_horizontal(&self, surface: &Grid2D, operation: &'static str) -> FieldResult<()> {
        let expected = self.shape.horizontal();
        if surface.shape() == expected {
            Ok(())
        } else {
            Err(FieldError::ShapeMismatch {
                operation,
                expected: expected.to_string(),
                found: surface.shape().to_string(),
            })
        }
    }

    /// Maximum over each vertical column
    #[must_use]
    pub fn column_max(&self) -> Grid2D {
        let shape = self.shape.horizontal();
        let layer = shape.len();
        Grid2D::from_index_fn(shape, |idx| {
            (0..self.shape.nz)
                .map(|iz| self.data[iz * layer + idx])
                .fold(f32::NEG_INFINITY, f32::max)
        })
    }

    /// Copy out the inclusive voxel box `[min, max]` (x, y, z order)
    ///
    /// # Errors
    /// Returns `InvalidExtent` if the box is inverted or leaves the grid.
    pub fn crop(&self, min: [usize; 3], max: [usize; 3]) -> FieldResult<Grid3D> {
        let dims = [self.shape.nx, self.shape.ny, self.shape.nz];
        for axis in 0..3 {
            if min[axis] > max[axis] || max[axis] >= dims[axis] {
                return Err(FieldError::InvalidExtent(format!(
                    "box {min:?}..={max:?} does not fit grid {}",
                    self.shape
                )));
            }
        }
        let shape = Shape3::new(
            max[0] - min[0] + 1,
            max[1] - min[1] + 1,
            max[2] - min[2] + 1,
        );
        Ok(Grid3D::from_fn(shape, |ix, iy, iz| {
            self.get(ix + min[0], iy + min[1], iz + min[2])
        }))
    }
}

/// Dense 2D field of f32 samples
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2D {
    data: Vec<f32>,
    shape: Shape2,
}

impl Grid2D {
    /// Create a grid initialized to zero
    #[must_use]
    pub fn new(shape: Shape2) -> Self {
        Self::filled(shape, 0.0)
    }

    /// Create a grid with every sample set to `value`
    #[must_use]
    pub fn filled(shape: Shape2, value: f32) -> Self {
        Self {
            data: vec![value; shape.len()],
            shape,
        }
    }

    /// Wrap an existing buffer laid out in row-major order
    ///
    /// # Errors
    /// Returns `LengthMismatch` if `data.len()` differs from `shape.len()`.
    pub fn from_vec(shape: Shape2, data: Vec<f32>) -> FieldResult<Self> {
        if data.len() != shape.len() {
            return Err(FieldError::LengthMismatch {
                expected: shape.len(),
                found: data.len(),
            });
        }
        Ok(Self { data, shape })
    }

    /// Build a grid by evaluating `f(ix, iy)` at every sample
    #[must_use]
    pub fn from_fn<F>(shape: Shape2, f: F) -> Self
    where
        F: Fn(usize, usize) -> f32 + Sync + Send,
    {
        let nx = shape.nx.max(1);
        Self::from_index_fn(shape, |idx| f(idx % nx, idx / nx))
    }

    /// Build a grid by evaluating `f(flat_index)` at every sample in parallel
    #[must_use]
    pub fn from_index_fn<F>(shape: Shape2, f: F) -> Self
    where
        F: Fn(usize) -> f32 + Sync + Send,
    {
        let data = (0..shape.len()).into_par_iter().map(f).collect();
        Self { data, shape }
    }

    /// Grid shape
    #[must_use]
    pub fn shape(&self) -> Shape2 {
        self.shape
    }

    /// Total number of samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the grid holds no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat storage index of a sample
    #[inline]
    #[must_use]
    pub fn index(&self, ix: usize, iy: usize) -> usize {
        iy * self.shape.nx + ix
    }

    /// Sample at grid coordinates
    ///
    /// # Panics
    /// Panics if the coordinates are outside the grid.
    #[inline]
    #[must_use]
    pub fn get(&self, ix: usize, iy: usize) -> f32 {
        self.data[self.index(ix, iy)]
    }

    /// Overwrite a sample at grid coordinates
    #[inline]
    pub fn set(&mut self, ix: usize, iy: usize, value: f32) {
        let idx = self.index(ix, iy);
        self.data[idx] = value;
    }

    /// Samples in row-major order
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable samples in row-major order
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consume the grid and return its buffer
    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Apply `f` to every sample, producing a new grid
    #[must_use]
    pub fn map<F>(&self, f: F) -> Grid2D
    where
        F: Fn(f32) -> f32 + Sync + Send,
    {
        Grid2D {
            data: self.data.par_iter().map(|&v| f(v)).collect(),
            shape: self.shape,
        }
    }

    /// Check that `other` has the same shape as `self`
    ///
    /// # Errors
    /// Returns `ShapeMismatch` naming `operation` if the shapes differ.
    pub fn ensure_same_shape(&self, other: &Grid2D, operation: &'static str) -> FieldResult<()> {
        if self.shape == other.shape {
            Ok(())
        } else {
            Err(FieldError::ShapeMismatch {
                operation,
                expected: self.shape.to_string(),
                found: other.shape.to_string(),
            })
        }
    }

    /// Copy out the inclusive box `[min, max]` (x, y order)
    ///
    /// # Errors
    /// Returns `InvalidExtent` if the box is inverted or leaves the grid.
    pub fn crop(&self, min: [usize; 2], max: [usize; 2]) -> FieldResult<Grid2D> {
        let dims = [self.shape.nx, self.shape.ny];
        for axis in 0..2 {
            if min[axis] > max[axis] || max[axis] >= dims[axis] {
                return Err(FieldError::InvalidExtent(format!(
                    "box {min:?}..={max:?} does not fit grid {}",
                    self.shape
                )));
            }
        }
        let shape = Shape2::new(max[0] - min[0] + 1, max[1] - min[1] + 1);
        Ok(Grid2D::from_fn(shape, |ix, iy| {
            self.get(ix + min[0], iy + min[1])
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_layout_is_x_fastest() {
        let grid = Grid3D::from_fn(Shape3::new(4, 3, 2), |ix, iy, iz| {
            (ix + 10 * iy + 100 * iz) as f32
        });
        assert_eq!(grid.as_slice()[1], 1.0);
        assert_eq!(grid.as_slice()[4], 10.0);
        assert_eq!(grid.as_slice()[12], 100.0);
        assert_eq!(grid.get(3, 2, 1), 123.0);
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        let err = Grid3D::from_vec(Shape3::new(2, 2, 2), vec![0.0; 7]).unwrap_err();
        assert_eq!(
            err,
            FieldError::LengthMismatch {
                expected: 8,
                found: 7
            }
        );
    }

    #[test]
    fn test_zip_map_checks_shape() {
        let a = Grid3D::new(Shape3::new(2, 2, 2));
        let b = Grid3D::new(Shape3::new(2, 2, 3));
        assert!(matches!(
            a.zip_map(&b, "add", |x, y| x + y),
            Err(FieldError::ShapeMismatch { operation: "add", .. })
        ));
    }

    #[test]
    fn test_column_max_and_level() {
        let grid = Grid3D::from_fn(Shape3::new(2, 2, 3), |ix, _, iz| {
            if iz == 1 { 50.0 + ix as f32 } else { iz as f32 }
        });
        let max = grid.column_max();
        assert_eq!(max.get(0, 0), 50.0);
        assert_eq!(max.get(1, 1), 51.0);
        assert_eq!(grid.level(2).get(1, 0), 2.0);
    }

    #[test]
    fn test_crop_extracts_inclusive_box() {
        let grid = Grid3D::from_fn(Shape3::new(5, 4, 3), |ix, iy, iz| {
            (ix + 10 * iy + 100 * iz) as f32
        });
        let sub = grid.crop([1, 1, 1], [3, 2, 2]).unwrap();
        assert_eq!(sub.shape(), Shape3::new(3, 2, 2));
        assert_eq!(sub.get(0, 0, 0), 111.0);
        assert_eq!(sub.get(2, 1, 1), 223.0);

        assert!(grid.crop([0, 0, 0], [5, 0, 0]).is_err());
        assert!(grid.crop([2, 0, 0], [1, 0, 0]).is_err());
    }
}
