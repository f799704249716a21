use anyhow::{ensure, Result};
use ndarray::{Array1, Array2};

/// Regular sampling of a 3-D region. Points are spaced `pixel_size` apart along
/// each axis, endpoints included. An axis with equal min and max holds a single
/// point, so an oxz imaging plane is simply the `numy == 1` case.
pub struct Grid {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub zmin: f64,
    pub zmax: f64,
    pub pixel_size: f64,
    pub x: Array1<f64>,
    pub y: Array1<f64>,
    pub z: Array1<f64>,
}

impl Grid {
    pub fn new(
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
        zmin: f64,
        zmax: f64,
        pixel_size: f64,
    ) -> Result<Self> {
        ensure!(
            pixel_size > 0.0,
            "pixel size must be positive, got {}",
            pixel_size
        );
        ensure!(xmax >= xmin, "xmax ({}) is below xmin ({})", xmax, xmin);
        ensure!(ymax >= ymin, "ymax ({}) is below ymin ({})", ymax, ymin);
        ensure!(zmax >= zmin, "zmax ({}) is below zmin ({})", zmax, zmin);

        let x = axis_points(xmin, xmax, pixel_size);
        let y = axis_points(ymin, ymax, pixel_size);
        let z = axis_points(zmin, zmax, pixel_size);
        Ok(Grid {
            xmin,
            xmax,
            ymin,
            ymax,
            zmin,
            zmax,
            pixel_size,
            x,
            y,
            z,
        })
    }

    pub fn numx(&self) -> usize {
        self.x.len()
    }

    pub fn numy(&self) -> usize {
        self.y.len()
    }

    pub fn numz(&self) -> usize {
        self.z.len()
    }

    pub fn numpoints(&self) -> usize {
        self.numx() * self.numy() * self.numz()
    }

    /// x coordinate of every point of the oxz plane, shape `(numx, numz)`.
    pub fn xx(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.numx(), self.numz()), |(i, _)| self.x[i])
    }

    /// z coordinate of every point of the oxz plane, shape `(numx, numz)`.
    pub fn zz(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.numx(), self.numz()), |(_, k)| self.z[k])
    }
}

fn axis_points(min: f64, max: f64, pixel_size: f64) -> Array1<f64> {
    let num = ((max - min) / pixel_size).round() as usize + 1;
    Array1::linspace(min, max, num.max(1))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use super::*;

    fn canonical_grid() -> Grid {
        Grid::new(-5e-3, 5e-3, 0.0, 0.0, 0.0, 15e-3, 0.1e-3).unwrap()
    }

    #[test]
    fn test_point_counts() {
        let grid = canonical_grid();
        assert_eq!(grid.numx(), 101);
        assert_eq!(grid.numy(), 1);
        assert_eq!(grid.numz(), 151);
        assert_eq!(grid.numpoints(), 101 * 151);
    }

    #[test]
    fn test_axis_coordinates() {
        let grid = canonical_grid();
        assert_relative_eq!(grid.x[0], -5e-3);
        assert_relative_eq!(grid.x[100], 5e-3);
        assert_relative_eq!(grid.x[1] - grid.x[0], 0.1e-3, epsilon = 1e-12);
        assert_relative_eq!(grid.z[0], 0.0);
        assert_relative_eq!(grid.z[150], 15e-3);
        assert_relative_eq!(grid.y[0], 0.0);
    }

    #[test]
    fn test_meshgrids() {
        let grid = canonical_grid();
        let xx = grid.xx();
        let zz = grid.zz();
        assert_eq!(xx.dim(), (101, 151));
        assert_eq!(zz.dim(), (101, 151));
        assert_relative_eq!(xx[[0, 42]], grid.x[0]);
        assert_relative_eq!(xx[[57, 0]], grid.x[57]);
        assert_relative_eq!(zz[[0, 42]], grid.z[42]);
        assert_relative_eq!(zz[[57, 3]], grid.z[3]);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(Grid::new(0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0).is_err());
        assert!(Grid::new(0.0, 1.0, 0.0, 0.0, 0.0, 1.0, -0.1).is_err());
        assert!(Grid::new(1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.1).is_err());
        assert!(Grid::new(0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.1).is_err());
    }
}
