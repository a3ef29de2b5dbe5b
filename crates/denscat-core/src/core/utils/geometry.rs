use crate::core::models::grid::DensityGrid;
use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};

/// Physical position of voxel `(i, j, k)` relative to the central voxel `n / 2`.
#[inline]
pub fn voxel_position(grid: &DensityGrid, i: usize, j: usize, k: usize) -> Point3<f64> {
    let center = (grid.n() / 2) as f64;
    let voxel = grid.voxel_size();
    Point3::new(
        (i as f64 - center) * voxel,
        (j as f64 - center) * voxel,
        (k as f64 - center) * voxel,
    )
}

/// Density-weighted inertia tensor about the grid centre:
/// `sum(rho * (|r|^2 * I - r r^T))`.
pub fn inertia_tensor(grid: &DensityGrid) -> Matrix3<f64> {
    let n = grid.n();
    let mut tensor = Matrix3::zeros();
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let rho = grid.get(i, j, k);
                if rho == 0.0 {
                    continue;
                }
                let r = voxel_position(grid, i, j, k).coords;
                tensor += (Matrix3::identity() * r.norm_squared() - r * r.transpose()) * rho;
            }
        }
    }
    tensor
}

/// Principal axes of a symmetric tensor as the columns of the returned matrix, ordered by
/// ascending eigenvalue, together with the sorted eigenvalues.
pub fn principal_axes(tensor: &Matrix3<f64>) -> (Matrix3<f64>, Vector3<f64>) {
    let eigen = SymmetricEigen::new(*tensor);
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

    let axes = Matrix3::from_columns(&order.map(|c| eigen.eigenvectors.column(c).into_owned()));
    let values = Vector3::new(
        eigen.eigenvalues[order[0]],
        eigen.eigenvalues[order[1]],
        eigen.eigenvalues[order[2]],
    );
    (axes, values)
}

/// The eight diagonal sign matrices `diag(±1, ±1, ±1)`.
pub fn sign_combinations() -> [Matrix3<f64>; 8] {
    std::array::from_fn(|bits| {
        let sign = |bit: usize| if bits & (1 << bit) == 0 { 1.0 } else { -1.0 };
        Matrix3::from_diagonal(&Vector3::new(sign(0), sign(1), sign(2)))
    })
}

/// Trilinear interpolation at a fractional index position. Samples outside the grid
/// contribute zero.
pub fn sample_trilinear(grid: &DensityGrid, at: [f64; 3]) -> f64 {
    let n = grid.n() as isize;
    let base = at.map(|c| c.floor());
    let frac = [at[0] - base[0], at[1] - base[1], at[2] - base[2]];
    let base = base.map(|c| c as isize);

    let mut value = 0.0;
    for corner in 0..8usize {
        let offset = [corner & 1, (corner >> 1) & 1, (corner >> 2) & 1];
        let idx = [
            base[0] + offset[0] as isize,
            base[1] + offset[1] as isize,
            base[2] + offset[2] as isize,
        ];
        if idx.iter().any(|&c| c < 0 || c >= n) {
            continue;
        }
        let weight: f64 = (0..3)
            .map(|axis| {
                if offset[axis] == 1 {
                    frac[axis]
                } else {
                    1.0 - frac[axis]
                }
            })
            .product();
        if weight != 0.0 {
            value += weight * grid.get(idx[0] as usize, idx[1] as usize, idx[2] as usize);
        }
    }
    value
}

/// Applies `rotation` (a proper or improper orthogonal matrix) about the grid centre.
/// Each output voxel pulls its value from `rotation^T * r` in the source map.
pub fn transform_grid(grid: &DensityGrid, rotation: &Matrix3<f64>) -> DensityGrid {
    let n = grid.n();
    let center = (n / 2) as f64;
    let inverse = rotation.transpose();
    let mut out = grid.clone();
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let r = Vector3::new(i as f64 - center, j as f64 - center, k as f64 - center);
                let src = inverse * r;
                let value =
                    sample_trilinear(grid, [src.x + center, src.y + center, src.z + center]);
                out.set(i, j, k, value);
            }
        }
    }
    out
}
