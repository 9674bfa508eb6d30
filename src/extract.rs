use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, warn};

use crate::{
    field::ScalarField,
    grid::{GridBounds, SampledGrid},
    interp::{find_t, interpolate_points},
    mesh::IsoMesh,
    tables::{CORNER_OFFSETS, EDGE_CONNECTIONS, EDGE_MIDPOINTS, EDGE_TABLE, TRI_TABLE},
    types::Value,
};

/// Where an emitted vertex sits along a crossed cell edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgePlacement {
    /// The fixed midpoint of the edge, regardless of the sampled values.
    ///
    /// This reproduces the crate's original placement rule and gives blockier
    /// surfaces than canonical marching cubes; [`Interpolated`](Self::Interpolated)
    /// is the accurate variant.
    #[default]
    Midpoint,
    /// Linear interpolation along the edge to the point where the field is
    /// estimated to equal the isovalue.
    Interpolated,
}

/// Parameters for one extraction pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtractParams {
    /// Sampling volume and lattice spacing.
    pub bounds: GridBounds,
    /// Field value the surface traces. Samples strictly below it are
    /// "inside"; a sample exactly equal to the isovalue is outside.
    pub isovalue: Value,
    /// Vertex placement rule along crossed edges.
    pub placement: EdgePlacement,
}

impl ExtractParams {
    pub fn new(bounds: GridBounds, isovalue: Value) -> Self {
        Self {
            bounds,
            isovalue,
            placement: EdgePlacement::default(),
        }
    }

    pub fn with_placement(mut self, placement: EdgePlacement) -> Self {
        self.placement = placement;
        self
    }
}

/// Extracts the isosurface of `field` over `params.bounds` as a triangle mesh.
///
/// The field is sampled once at every lattice corner, then each cell is
/// classified against the isovalue and triangulated from the static tables.
/// Output is deterministic: identical inputs produce identical meshes.
pub fn extract<F>(field: &F, params: &ExtractParams) -> IsoMesh
where
    F: ScalarField + ?Sized,
{
    let grid = SampledGrid::from_field(field, params.bounds);
    extract_sampled(&grid, params.isovalue, params.placement)
}

/// Extraction over corner samples captured up front in a [`SampledGrid`].
///
/// Cells are marched in parallel, one Rayon task per x-slice; slice results
/// are merged in slice order, so the vertex sequence matches what a serial
/// `i → j → k` traversal would emit.
pub fn extract_sampled(grid: &SampledGrid, isovalue: Value, placement: EdgePlacement) -> IsoMesh {
    let cells = grid.cells_per_axis();
    if cells == 0 {
        warn!(
            min = grid.bounds().min as f64,
            max = grid.bounds().max as f64,
            step = grid.bounds().step as f64,
            "degenerate grid bounds, emitting empty mesh"
        );
        return IsoMesh::default();
    }

    let bounds = grid.bounds();
    let per_slice: Vec<Vec<[Value; 3]>> = (0..cells)
        .into_par_iter()
        .map(|i| {
            let mut local = Vec::new();
            for j in 0..cells {
                for k in 0..cells {
                    march_cell(grid, &bounds, isovalue, placement, [i, j, k], &mut local);
                }
            }
            local
        })
        .collect();

    let total: usize = per_slice.iter().map(Vec::len).sum();
    let mut vertices = Vec::with_capacity(total);
    for mut slice in per_slice {
        vertices.append(&mut slice);
    }

    debug!(
        cells = cells * cells * cells,
        triangles = vertices.len() / 3,
        "isosurface extracted"
    );

    IsoMesh::from_triangle_soup(vertices)
}

/// Sampled values at the 8 corners of cell `(i, j, k)`, in configuration-bit
/// order.
#[inline]
fn corner_values(grid: &SampledGrid, [i, j, k]: [usize; 3]) -> [Value; 8] {
    CORNER_OFFSETS.map(|[dx, dy, dz]| grid.value(i + dx, j + dy, k + dz))
}

/// 8-bit cube configuration: bit `n` set when `corner[n] < isovalue`.
///
/// The comparison is strict, so a sample exactly at the isovalue counts as
/// outside the surface.
#[inline]
fn corner_mask(values: &[Value; 8], isovalue: Value) -> usize {
    let mut mask = 0;
    for (n, &v) in values.iter().enumerate() {
        if v < isovalue {
            mask |= 1 << n;
        }
    }
    mask
}

/// Positions on each crossed edge of the cell, `None` for uncrossed edges.
#[inline]
fn edge_points(
    edges_mask: u16,
    cell_min: [Value; 3],
    step: Value,
    values: &[Value; 8],
    isovalue: Value,
    placement: EdgePlacement,
) -> [Option<[Value; 3]>; 12] {
    let mut points = [None; 12];

    for (edge, point) in points.iter_mut().enumerate() {
        if edges_mask & (1 << edge) == 0 {
            continue;
        }

        let fraction = match placement {
            EdgePlacement::Midpoint => EDGE_MIDPOINTS[edge],
            EdgePlacement::Interpolated => {
                let [a, b] = EDGE_CONNECTIONS[edge];
                let t = find_t(values[a], values[b], isovalue);
                let start = CORNER_OFFSETS[a].map(|c| c as Value);
                let end = CORNER_OFFSETS[b].map(|c| c as Value);
                interpolate_points(start, end, t)
            }
        };

        *point = Some([
            cell_min[0] + fraction[0] * step,
            cell_min[1] + fraction[1] * step,
            cell_min[2] + fraction[2] * step,
        ]);
    }

    points
}

/// Classifies one cell and appends its triangles to `out`.
///
/// ```text
/// 1. corner_values   →  8 scalar samples
/// 2. corner_mask     →  256-entry lookup key
/// 3. EDGE_TABLE      →  bitmask of crossed edges
/// 4. edge_points     →  up to 12 positions on those edges
/// 5. TRI_TABLE       →  triangle vertices, in table order
/// ```
fn march_cell(
    grid: &SampledGrid,
    bounds: &GridBounds,
    isovalue: Value,
    placement: EdgePlacement,
    cell: [usize; 3],
    out: &mut Vec<[Value; 3]>,
) {
    let values = corner_values(grid, cell);
    let mask = corner_mask(&values, isovalue);

    let edges_mask = EDGE_TABLE[mask];
    if edges_mask == 0 {
        // Fully inside or fully outside; TRI_TABLE is empty here too.
        return;
    }

    let cell_min = bounds.corner(cell[0], cell[1], cell[2]);
    let points = edge_points(edges_mask, cell_min, bounds.step, &values, isovalue, placement);

    for &edge in TRI_TABLE[mask].iter().take_while(|&&e| e != -1) {
        // TRI_TABLE only lists edges set in EDGE_TABLE, so the point exists.
        if let Some(point) = points[edge as usize] {
            out.push(point);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Sphere;

    fn unit_sphere_params(step: Value) -> ExtractParams {
        ExtractParams::new(GridBounds::new(-2.0, 2.0, step), 1.0)
    }

    #[test]
    fn field_entirely_above_isovalue_is_empty() {
        let field = |_: Value, _: Value, _: Value| 2.0;
        let params = ExtractParams::new(GridBounds::new(0.0, 2.0, 0.5), 1.0);
        assert!(extract(&field, &params).is_empty());
    }

    #[test]
    fn field_entirely_below_isovalue_is_empty() {
        let field = |_: Value, _: Value, _: Value| 0.0;
        let params = ExtractParams::new(GridBounds::new(0.0, 2.0, 0.5), 1.0);
        assert!(extract(&field, &params).is_empty());
    }

    #[test]
    fn sample_equal_to_isovalue_counts_as_outside() {
        let field = |_: Value, _: Value, _: Value| 1.0;
        let params = ExtractParams::new(GridBounds::new(0.0, 2.0, 0.5), 1.0);
        assert!(extract(&field, &params).is_empty());
    }

    #[test]
    fn degenerate_bounds_yield_empty_mesh() {
        for bounds in [
            GridBounds::new(0.0, 1.0, 0.0),
            GridBounds::new(0.0, 1.0, -1.0),
            GridBounds::new(1.0, 0.0, 0.5),
        ] {
            let mesh = extract(&Sphere, &ExtractParams::new(bounds, 1.0));
            assert!(mesh.is_empty());
        }
    }

    #[test]
    fn mesh_invariants_hold() {
        let mesh = extract(&Sphere, &unit_sphere_params(0.5));
        assert!(!mesh.is_empty());
        assert_eq!(mesh.vertices.len() % 3, 0);
        assert_eq!(mesh.normals.len(), mesh.vertices.len());
        assert_eq!(mesh.indices.len(), mesh.vertices.len());
        for tri in mesh.normals.chunks_exact(3) {
            assert_eq!(tri[0], tri[1]);
            assert_eq!(tri[1], tri[2]);
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let params = unit_sphere_params(0.5);
        let a = extract(&Sphere, &params);
        let b = extract(&Sphere, &params);
        assert_eq!(a.vertices, b.vertices);
        assert_eq!(a.normals, b.normals);
        assert_eq!(a.indices, b.indices);
    }

    #[test]
    fn sphere_vertices_lie_near_the_unit_sphere() {
        let step = 0.5;
        // All emitted vertices sit on cell edges, so they can be at most one
        // cell diagonal away from the true surface.
        let tolerance = step * 3.0_f32.sqrt();
        for placement in [EdgePlacement::Midpoint, EdgePlacement::Interpolated] {
            let params = unit_sphere_params(step).with_placement(placement);
            let mesh = extract(&Sphere, &params);
            assert!(!mesh.is_empty());
            for v in &mesh.vertices {
                let r = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
                assert!(
                    (r - 1.0).abs() <= tolerance,
                    "vertex {v:?} at radius {r} with {placement:?}"
                );
            }
        }
    }

    #[test]
    fn single_inside_corner_emits_one_triangle() {
        // One cell; only the corner at the origin is below the isovalue.
        let field = |x: Value, y: Value, z: Value| x + y + z;
        let params = ExtractParams::new(GridBounds::new(0.0, 1.0, 1.0), 0.5);
        let mesh = extract(&field, &params);
        assert_eq!(mesh.triangle_count(), 1);
        // The cut crosses edges incident to corner 0, at fractional offset
        // 0.5 under both placement rules for this field.
        let mut vertices = mesh.vertices.clone();
        vertices.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(vertices, vec![[0.0, 0.0, 0.5], [0.0, 0.5, 0.0], [0.5, 0.0, 0.0]]);
    }

    #[test]
    fn single_cell_all_configurations_match_table_counts() {
        use crate::tables::TRI_TABLE;

        for config in 0..256usize {
            // A field that recreates exactly this configuration on one cell:
            // inside corners sample -1, outside corners +1 against isovalue 0.
            let field = move |x: Value, y: Value, z: Value| {
                let corner = [x as usize, y as usize, z as usize];
                let n = CORNER_OFFSETS.iter().position(|&c| c == corner);
                match n {
                    Some(n) if config & (1 << n) != 0 => -1.0,
                    _ => 1.0,
                }
            };
            let params = ExtractParams::new(GridBounds::new(0.0, 1.0, 1.0), 0.0);
            let mesh = extract(&field, &params);

            let expected = TRI_TABLE[config]
                .iter()
                .take_while(|&&e| e != -1)
                .count()
                / 3;
            assert_eq!(mesh.triangle_count(), expected, "config {config:#04x}");
        }
    }

    #[test]
    fn interpolated_placement_tracks_the_field() {
        // Plane x = 0.25 crossing a unit cell: interpolation puts vertices at
        // x = 0.25, midpoints put them at x = 0.5.
        let field = |x: Value, _: Value, _: Value| x;
        let bounds = GridBounds::new(0.0, 1.0, 1.0);

        let interpolated = extract(
            &field,
            &ExtractParams::new(bounds, 0.25).with_placement(EdgePlacement::Interpolated),
        );
        assert!(!interpolated.is_empty());
        for v in &interpolated.vertices {
            assert!((v[0] - 0.25).abs() < 1e-6, "vertex {v:?}");
        }

        let midpoint = extract(
            &field,
            &ExtractParams::new(bounds, 0.25).with_placement(EdgePlacement::Midpoint),
        );
        for v in &midpoint.vertices {
            assert!((v[0] - 0.5).abs() < 1e-6, "vertex {v:?}");
        }
    }

    #[test]
    fn presampled_grid_matches_direct_extraction() {
        let params = unit_sphere_params(0.5);
        let grid = SampledGrid::from_field(&Sphere, params.bounds);
        let sampled = extract_sampled(&grid, params.isovalue, params.placement);
        let direct = extract(&Sphere, &params);
        assert_eq!(sampled.vertices, direct.vertices);
    }
}
