use num_traits::Float;
use rand::Rng;

use crate::error::ModelError;

/// Immutable N×N symmetric coupling matrix J.
///
/// Built once per process run and shared by reference across every concurrent
/// annealing run; reads need no locking because there is no mutation after
/// construction. Diagonal entries are self-terms (default 0).
pub struct Lattice<T> {
    size: usize,
    values: Vec<T>,
}

impl<T: Float> Lattice<T> {
    /// All-zero lattice of the given size.
    pub fn zeros(size: usize) -> Self {
        Lattice {
            size,
            values: vec![T::zero(); size * size],
        }
    }

    /// Random symmetric lattice: off-diagonal entries uniform in (-1, 1),
    /// mirrored across the diagonal, diagonal forced to zero.
    pub fn random<R: Rng>(size: usize, rng: &mut R) -> Self {
        let mut lattice = Self::zeros(size);
        for i in 0..size {
            for j in (i + 1)..size {
                let value = T::from(2.0 * rng.gen::<f64>() - 1.0).unwrap_or_else(T::zero);
                lattice.values[i * size + j] = value;
                lattice.values[j * size + i] = value;
            }
        }
        lattice
    }

    /// Build from N² row-major values. The upper triangle (including the
    /// diagonal) is taken as given and mirrored into the lower triangle, so
    /// symmetry holds by construction rather than by assumption.
    pub fn from_rows(size: usize, values: Vec<T>) -> Result<Self, ModelError> {
        if values.len() != size * size {
            return Err(ModelError::SizeMismatch {
                expected: size * size,
                actual: values.len(),
            });
        }
        let mut lattice = Lattice { size, values };
        for i in 0..size {
            for j in (i + 1)..size {
                lattice.values[j * size + i] = lattice.values[i * size + j];
            }
        }
        Ok(lattice)
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize) -> T {
        self.values[i * self.size + j]
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    #[test]
    fn random_lattice_is_symmetric_with_zero_diagonal() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(7);
        let lat: Lattice<f32> = Lattice::random(12, &mut rng);
        for i in 0..12 {
            assert_eq!(lat.at(i, i), 0.0);
            for j in 0..12 {
                assert_eq!(lat.at(i, j), lat.at(j, i));
            }
        }
    }

    #[test]
    fn from_rows_mirrors_upper_triangle() {
        // Deliberately asymmetric input; lower triangle must be overwritten.
        let lat = Lattice::from_rows(2, vec![0.5f32, 1.0, -3.0, 0.0]).unwrap();
        assert_eq!(lat.at(0, 1), 1.0);
        assert_eq!(lat.at(1, 0), 1.0);
        assert_eq!(lat.at(0, 0), 0.5);
        assert_eq!(lat.at(1, 1), 0.0);
    }

    #[test]
    fn from_rows_rejects_wrong_length() {
        assert!(Lattice::<f32>::from_rows(3, vec![0.0; 8]).is_err());
    }
}
