use super::*;
use crate::geometry::{Box2, Point};
use crate::mesh::rand::{jittered_quad_grid, quad_grid, triangle_grid};
use crate::mesh::{self, FaceTable, FILL_VALUE};

fn unit_square_tree() -> CellTree {
    let faces = FaceTable::from_rows(&[vec![0, 1, 2, 3]]);
    let vertices = vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 1.0),
    ];
    CellTree::new(faces, vertices).unwrap()
}

fn two_triangles_tree() -> CellTree {
    let faces = FaceTable::from_rows(&[vec![0, 1, 2], vec![0, 2, 3]]);
    let vertices = vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 1.0),
    ];
    CellTree::new(faces, vertices).unwrap()
}

fn grid_tree(nx: usize, ny: usize) -> CellTree {
    let (faces, vertices) = quad_grid(nx, ny);
    CellTree::new(faces, vertices).unwrap()
}

/// Brute-force bbox hits, sorted.
fn brute_force_box(tree: &CellTree, query: &Box2) -> Vec<usize> {
    (0..tree.n_faces())
        .filter(|&f| query.intersects(&tree.bb_coords()[f]))
        .collect()
}

#[test]
fn single_square_point_and_box_queries() {
    let tree = unit_square_tree();
    assert_eq!(tree.locate_point(Point::new(0.5, 0.5)), Some(0));
    assert_eq!(tree.locate_point(Point::new(1.5, 0.5)), None);

    let (ii, jj) = tree.locate_boxes(&[Box2::new(0.25, 0.75, 0.25, 0.75)]);
    assert_eq!(ii, vec![0]);
    assert_eq!(jj, vec![0]);
}

#[test]
fn two_triangles_locate_point() {
    let tree = two_triangles_tree();
    assert_eq!(tree.locate_point(Point::new(0.75, 0.25)), Some(0));
    assert_eq!(tree.locate_point(Point::new(0.25, 0.75)), Some(1));
}

#[test]
fn edge_through_single_square() {
    let tree = unit_square_tree();
    let (ii, jj, t) =
        tree.locate_edges(&[[Point::new(-0.5, 0.5), Point::new(1.5, 0.5)]]);
    assert_eq!(ii, vec![0]);
    assert_eq!(jj, vec![0]);
    assert!((t[0][0] - 0.25).abs() < 1e-12);
    assert!((t[0][1] - 0.75).abs() < 1e-12);
    assert_eq!(t[0][2], 0.0);
}

#[test]
fn exact_corner_point_is_deterministic() {
    // Exactly on a vertex is degenerate: the result is unspecified but must
    // be reproducible.
    let tree = unit_square_tree();
    let p = Point::new(0.0, 0.0);
    assert_eq!(tree.locate_point(p), tree.locate_point(p));
    let batch = tree.locate_points(&[p, p]);
    assert_eq!(batch[0], batch[1]);
}

#[test]
fn disjoint_box_yields_no_writes() {
    let tree = unit_square_tree();
    assert_eq!(tree.locate_box(&Box2::new(5.0, 6.0, 5.0, 6.0), None), 0);
    let (ii, jj) = tree.locate_boxes(&[Box2::new(5.0, 6.0, 5.0, 6.0)]);
    assert!(ii.is_empty());
    assert!(jj.is_empty());
}

#[test]
fn edge_across_grid_row() {
    // A horizontal cut at y = 2.5 across a 4x4 grid of unit squares crosses
    // exactly the four faces of the row y in [2, 3], with equally spaced
    // parametric intervals.
    let tree = grid_tree(4, 4);
    let (ii, jj, t) =
        tree.locate_edges(&[[Point::new(-1.0, 2.5), Point::new(5.0, 2.5)]]);
    assert_eq!(ii, vec![0; 4]);

    let mut hits: Vec<(usize, f64, f64)> =
        jj.iter().zip(&t).map(|(&f, row)| (f, row[0], row[1])).collect();
    hits.sort_by(|a, b| a.0.cmp(&b.0));
    for (k, &(face, t0, t1)) in hits.iter().enumerate() {
        assert_eq!(face, 8 + k);
        assert!((t0 - (k as f64 + 1.0) / 6.0).abs() < 1e-12);
        assert!((t1 - (k as f64 + 2.0) / 6.0).abs() < 1e-12);
    }
}

#[test]
fn centroid_roundtrip_on_structured_meshes() {
    let (faces, vertices) = quad_grid(8, 6);
    let tree = CellTree::new(faces, vertices).unwrap();
    for f in 0..tree.n_faces() {
        let c = mesh::face_centroid(tree.faces().face(f), tree.vertices());
        assert_eq!(tree.locate_point(c), Some(f));
    }

    let (faces, vertices) = triangle_grid(5, 5);
    let tree = CellTree::new(faces, vertices).unwrap();
    for f in 0..tree.n_faces() {
        let c = mesh::face_centroid(tree.faces().face(f), tree.vertices());
        assert_eq!(tree.locate_point(c), Some(f));
    }
}

#[test]
fn centroid_roundtrip_on_jittered_mesh() {
    let (faces, vertices) = jittered_quad_grid(6, 6, 0.2, 42);
    let tree = CellTree::new(faces, vertices).unwrap();
    for f in 0..tree.n_faces() {
        let c = mesh::face_centroid(tree.faces().face(f), tree.vertices());
        assert_eq!(tree.locate_point(c), Some(f));
    }
}

#[test]
fn box_query_matches_brute_force() {
    let (faces, vertices) = jittered_quad_grid(6, 5, 0.2, 11);
    let tree = CellTree::new(faces, vertices).unwrap();
    let queries = [
        Box2::new(0.25, 0.75, 0.25, 0.75),
        // Spans several splits.
        Box2::new(0.5, 5.5, 1.5, 3.5),
        // Covers everything.
        Box2::new(-1.0, 7.0, -1.0, 6.0),
        // Touches only the boundary of the first column's boxes.
        Box2::new(-1.0, 0.0, 0.0, 5.0),
    ];
    for query in &queries {
        let mut collected = vec![0usize; tree.n_faces()];
        let count = tree.locate_box(query, Some(&mut collected));
        collected.truncate(count);
        collected.sort_unstable();
        assert_eq!(collected, brute_force_box(&tree, query));
    }
}

#[test]
fn face_bbox_query_contains_face() {
    let (faces, vertices) = jittered_quad_grid(5, 4, 0.2, 3);
    let tree = CellTree::new(faces, vertices).unwrap();
    for f in 0..tree.n_faces() {
        let query = tree.bb_coords()[f];
        let mut collected = vec![0usize; tree.n_faces()];
        let count = tree.locate_box(&query, Some(&mut collected));
        assert!(collected[..count].contains(&f));
    }
}

#[test]
fn batch_counts_match_fill_totals() {
    let tree = grid_tree(6, 6);
    let queries: Vec<Box2> = (0..8)
        .map(|k| {
            let x = k as f64 * 0.7;
            Box2::new(x, x + 1.3, 0.2, 4.8)
        })
        .collect();
    let expected: usize = queries.iter().map(|q| tree.locate_box(q, None)).sum();
    let (ii, jj) = tree.locate_boxes(&queries);
    assert_eq!(ii.len(), expected);
    assert_eq!(jj.len(), expected);
    // Output rows are grouped by query index, in query order.
    assert!(ii.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn reversed_edge_mirrors_intervals() {
    let tree = grid_tree(4, 4);
    let a = Point::new(-0.5, 1.3);
    let b = Point::new(4.5, 3.1);
    let (_, jj, t) = tree.locate_edges(&[[a, b]]);
    let (_, jj_rev, t_rev) = tree.locate_edges(&[[b, a]]);

    let mut forward: Vec<(usize, f64, f64)> =
        jj.iter().zip(&t).map(|(&f, r)| (f, r[0], r[1])).collect();
    let mut backward: Vec<(usize, f64, f64)> = jj_rev
        .iter()
        .zip(&t_rev)
        .map(|(&f, r)| (f, 1.0 - r[1], 1.0 - r[0]))
        .collect();
    forward.sort_by(|x, y| x.0.cmp(&y.0));
    backward.sort_by(|x, y| x.0.cmp(&y.0));

    assert_eq!(forward.len(), backward.len());
    for (f, r) in forward.iter().zip(&backward) {
        assert_eq!(f.0, r.0);
        assert!((f.1 - r.1).abs() < 1e-12);
        assert!((f.2 - r.2).abs() < 1e-12);
    }
}

#[test]
fn degenerate_edge_acts_as_point_probe() {
    let tree = grid_tree(3, 3);
    let p = Point::new(1.5, 2.5);
    let (ii, jj, t) = tree.locate_edges(&[[p, p]]);
    assert_eq!(ii, vec![0]);
    assert_eq!(jj, vec![7]);
    assert_eq!((t[0][0], t[0][1]), (0.0, 0.0));

    let outside = Point::new(-1.0, -1.0);
    let (ii, _, _) = tree.locate_edges(&[[outside, outside]]);
    assert!(ii.is_empty());
}

#[test]
fn tolerant_point_location_accepts_near_edges() {
    let tree = grid_tree(2, 1);
    // On the edge shared by the two faces: the exact query may answer
    // either way, the tolerant one must find a face.
    let shared = Point::new(1.0, 0.5);
    assert!(tree.locate_point_with_tolerance(shared, 1e-9).is_some());
    // A hair outside the mesh boundary.
    let near = Point::new(0.5, 1.0 + 1e-12);
    assert_eq!(tree.locate_point(near), None);
    assert_eq!(tree.locate_point_with_tolerance(near, 1e-9), Some(0));
}

#[test]
fn batch_point_misses_are_minus_one() {
    let tree = grid_tree(2, 2);
    let result = tree.locate_points(&[
        Point::new(0.5, 0.5),
        Point::new(9.0, 9.0),
        Point::new(1.5, 1.5),
    ]);
    assert_eq!(result, vec![0, -1, 3]);
}

#[test]
fn from_parts_roundtrip_preserves_queries() {
    let built = grid_tree(4, 3);
    let tree = CellTree::from_parts(
        built.nodes().to_vec(),
        built.bb_indices().to_vec(),
        built.bb_coords().to_vec(),
        built.faces().clone(),
        built.vertices().to_vec(),
        *built.bbox(),
    )
    .unwrap();
    for f in 0..tree.n_faces() {
        let c = mesh::face_centroid(tree.faces().face(f), tree.vertices());
        assert_eq!(tree.locate_point(c), Some(f));
    }
}

#[test]
fn build_rejects_malformed_meshes() {
    // No faces at all.
    let empty = FaceTable::from_rows(&[]);
    assert!(matches!(
        CellTree::new(empty, vec![]),
        Err(TreeError::EmptyMesh)
    ));

    let vertices = vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 1.0),
    ];

    // Fill before position 3.
    let short = FaceTable::from_flat(vec![0, 1, FILL_VALUE, 2], 4);
    assert!(matches!(
        CellTree::new(short, vertices.clone()),
        Err(TreeError::FaceTooShort { face: 0 })
    ));

    // Vertex index out of range.
    let dangling = FaceTable::from_rows(&[vec![0, 1, 9]]);
    assert!(matches!(
        CellTree::new(dangling, vertices.clone()),
        Err(TreeError::VertexOutOfRange { face: 0, index: 9, .. })
    ));

    // Non-finite coordinate.
    let faces = FaceTable::from_rows(&[vec![0, 1, 2]]);
    let mut bad_vertices = vertices.clone();
    bad_vertices[1] = Point::new(f64::NAN, 0.0);
    assert!(matches!(
        CellTree::new(faces, bad_vertices),
        Err(TreeError::NonFiniteVertex { index: 1 })
    ));
}

#[test]
fn from_parts_rejects_inconsistent_arrays() {
    let built = two_triangles_tree();

    // Permutation with a duplicate.
    let result = CellTree::from_parts(
        built.nodes().to_vec(),
        vec![0, 0],
        built.bb_coords().to_vec(),
        built.faces().clone(),
        built.vertices().to_vec(),
        *built.bbox(),
    );
    assert!(matches!(result, Err(TreeError::InvalidPermutation)));

    // Box array of the wrong length.
    let result = CellTree::from_parts(
        built.nodes().to_vec(),
        built.bb_indices().to_vec(),
        vec![],
        built.faces().clone(),
        built.vertices().to_vec(),
        *built.bbox(),
    );
    assert!(matches!(
        result,
        Err(TreeError::ShapeMismatch { name: "bb_coords", .. })
    ));

    // Interior node pointing at itself.
    let nodes = vec![Node::interior(0, 1.0, 0.0, 0)];
    let result = CellTree::from_parts(
        nodes,
        built.bb_indices().to_vec(),
        built.bb_coords().to_vec(),
        built.faces().clone(),
        built.vertices().to_vec(),
        *built.bbox(),
    );
    assert!(matches!(result, Err(TreeError::MalformedNode { index: 0 })));
}

#[test]
fn builder_produces_consistent_leaves() {
    let tree = grid_tree(8, 8);
    assert!(tree.nodes().len() > 1);
    let mut total = 0usize;
    for node in tree.nodes() {
        if node.is_leaf() {
            total += node.size as usize;
        } else {
            // Children are allocated after their parent, left then right.
            assert!(node.child > 0);
        }
    }
    assert_eq!(total, tree.n_faces());
}
