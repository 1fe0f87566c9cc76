//! Planes and least-squares plane fitting.

use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};

/// An oriented plane `normal · x + offset = 0` with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vector3<f64>,
    /// Signed offset from the origin along `-normal`.
    pub offset: f64,
}

impl Plane {
    /// Plane through `point` with normal `normal`.
    ///
    /// Returns `None` for a zero-length normal.
    #[must_use]
    pub fn from_point_normal(point: &Point3<f64>, normal: &Vector3<f64>) -> Option<Self> {
        let normal = normal.try_normalize(1e-12)?;
        Some(Self {
            normal,
            offset: -normal.dot(&point.coords),
        })
    }

    /// Plane through three points, `None` if they are collinear.
    #[must_use]
    pub fn through(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Option<Self> {
        let normal = (b - a).cross(&(c - a));
        Self::from_point_normal(a, &normal)
    }

    /// Least-squares plane through `points`.
    ///
    /// The normal is the covariance eigenvector with the smallest eigenvalue.
    /// Returns `None` for fewer than three points.
    #[must_use]
    pub fn fit<'a>(points: impl Iterator<Item = &'a Point3<f64>> + Clone) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = Vector3::zeros();
        for p in points.clone() {
            sum += p.coords;
            count += 1;
        }
        if count < 3 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let centroid = Point3::from(sum / count as f64);

        let mut cov = Matrix3::zeros();
        for p in points {
            let diff = p - centroid;
            cov += diff * diff.transpose();
        }

        let eigen = SymmetricEigen::new(cov);
        let min_idx = eigen.eigenvalues.imin();
        let normal: Vector3<f64> = eigen.eigenvectors.column(min_idx).into_owned();
        Self::from_point_normal(&centroid, &normal)
    }

    /// Signed distance from `point`.
    #[inline]
    #[must_use]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) + self.offset
    }

    /// Orthogonal projection of `point` onto the plane.
    #[inline]
    #[must_use]
    pub fn project(&self, point: &Point3<f64>) -> Point3<f64> {
        point - self.normal * self.signed_distance(point)
    }

    /// Same plane with the normal flipped.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    /// Orthonormal in-plane axes `(u, v)` with `u × v = normal`.
    #[must_use]
    pub fn basis(&self) -> (Vector3<f64>, Vector3<f64>) {
        let n = self.normal;
        let helper = if n.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let u = n.cross(&helper).normalize();
        let v = n.cross(&u);
        (u, v)
    }
}
