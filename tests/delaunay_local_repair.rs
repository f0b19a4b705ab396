//! Integration tests for edge flips and single-pass local repair through the
//! public mesh API.

use planar_delaunay::core::algorithms::flips::{
    FlipError, flip_edge, is_locally_delaunay, repair_local,
};
use planar_delaunay::core::algorithms::incremental_insertion::split_inside;
use planar_delaunay::prelude::*;

struct Quad {
    tds: Tds,
    cache: SpatialCache,
    factory: TriangleFactory,
    keys: [VertexKey; 4],
    lower: TriangleKey,
    upper: TriangleKey,
}

/// Two triangles sharing the edge `(-1, 0)-(1, 0)`, with apexes `(0, -h)` and `d`.
fn quad(h: f64, d: Vertex) -> Quad {
    let mut tds = Tds::new(DEFAULT_EPSILON);
    let mut factory = TriangleFactory::new();
    let a = tds.insert_vertex(vertex!(1, 0.0, -h));
    let b = tds.insert_vertex(vertex!(2, -1.0, 0.0));
    let c = tds.insert_vertex(vertex!(3, 1.0, 0.0));
    let d = tds.insert_vertex(d);
    let lower = factory.create(&mut tds, [a, b, c]);
    let upper = factory.create(&mut tds, [d, c, b]);
    tds.bind(lower, [Some(upper), None, None]).unwrap();
    let cache = SpatialCache::bootstrap(&tds, &[lower, upper], &DelaunayConfig::default()).unwrap();
    Quad {
        tds,
        cache,
        factory,
        keys: [a, b, c, d],
        lower,
        upper,
    }
}

fn ids(tds: &Tds, key: TriangleKey) -> [VertexId; 3] {
    tds.corners(key).unwrap().map(|v| v.id())
}

/// Sorted id pairs of the quad edges other than the shared diagonal.
fn boundary_edges(
    tds: &Tds,
    lower: TriangleKey,
    upper: TriangleKey,
) -> FastHashSet<[VertexId; 2]> {
    let mut edges = FastHashSet::default();
    for (key, other) in [(lower, upper), (upper, lower)] {
        let triangle = tds.triangle(key).unwrap();
        let v = ids(tds, key);
        for k in 0..3 {
            if triangle.neighbor(k) != Some(other) {
                let (p, q) = (v[(k + 1) % 3], v[(k + 2) % 3]);
                edges.insert([p.min(q), p.max(q)]);
            }
        }
    }
    edges
}

#[test]
fn test_bind_is_symmetric() {
    let Quad {
        tds, lower, upper, ..
    } = quad(1.0, vertex!(4, 0.0, 1.0));
    assert_eq!(tds.triangle(lower).unwrap().neighbor(0), Some(upper));
    assert_eq!(tds.triangle(upper).unwrap().neighbor(0), Some(lower));
    assert_eq!(tds.shared_edge(lower, upper), Some(0));
    assert_eq!(tds.shared_edge(upper, lower), Some(0));
    assert!(tds.validate_neighbors().is_ok());
}

#[test]
fn test_thin_quad_is_repaired_by_one_flip() {
    let Quad {
        mut tds,
        mut cache,
        lower,
        upper,
        ..
    } = quad(0.2, vertex!(4, 0.0, 0.2));
    assert!(!is_locally_delaunay(&tds, lower, 0).unwrap());

    let stats = repair_local(&mut tds, &mut cache, &[lower, upper]).unwrap();
    assert_eq!(stats.flips_performed, 1);
    assert_eq!(stats.flips_rejected, 0);

    // The diagonal now joins the two apexes.
    assert_eq!(ids(&tds, lower), [1, 4, 3]);
    assert_eq!(ids(&tds, upper), [4, 1, 2]);
    assert!(tds.validate_neighbors().is_ok());
    assert!(tds.is_valid_triangle(lower) && tds.is_valid_triangle(upper));
    for edge in 0..3 {
        assert!(is_locally_delaunay(&tds, lower, edge).unwrap());
        assert!(is_locally_delaunay(&tds, upper, edge).unwrap());
    }
}

#[test]
fn test_fat_quad_is_left_alone() {
    let Quad {
        mut tds,
        mut cache,
        lower,
        upper,
        ..
    } = quad(3.0, vertex!(4, 0.0, 3.0));
    let stats = repair_local(&mut tds, &mut cache, &[lower, upper]).unwrap();
    assert_eq!(stats.flips_performed, 0);
    assert_eq!(stats.edges_checked, 6);
    assert_eq!(ids(&tds, lower), [1, 2, 3]);
}

#[test]
fn test_flip_errors() {
    let Quad {
        mut tds,
        mut cache,
        lower,
        ..
    } = quad(0.2, vertex!(4, 0.0, 0.2));
    assert!(matches!(
        flip_edge(&mut tds, &mut cache, lower, 1),
        Err(FlipError::NoNeighbor { edge: 1, .. })
    ));

    // A reflex apex makes the quad non-convex.
    let Quad {
        mut tds,
        mut cache,
        lower,
        ..
    } = quad(0.1, vertex!(4, 2.0, 0.1));
    assert!(matches!(
        flip_edge(&mut tds, &mut cache, lower, 0),
        Err(FlipError::Rejected { .. })
    ));
    assert_eq!(ids(&tds, lower), [1, 2, 3]);
}

#[test]
fn test_flip_relinks_outer_neighbors() {
    let Quad {
        mut tds,
        mut factory,
        keys: [a, b, c, d],
        lower,
        upper,
        ..
    } = quad(0.2, vertex!(4, 0.0, 0.2));

    // One clockwise triangle on the outside of each quad edge.
    let e_ab = tds.insert_vertex(vertex!(5, -0.7, -1.0));
    let e_ca = tds.insert_vertex(vertex!(6, 0.7, -1.0));
    let e_bd = tds.insert_vertex(vertex!(7, -0.7, 1.0));
    let e_dc = tds.insert_vertex(vertex!(8, 0.7, 1.0));
    let outer_ab = factory.create(&mut tds, [e_ab, b, a]);
    let outer_ca = factory.create(&mut tds, [e_ca, a, c]);
    let outer_bd = factory.create(&mut tds, [e_bd, d, b]);
    let outer_dc = factory.create(&mut tds, [e_dc, c, d]);
    tds.bind(outer_ab, [Some(lower), None, None]).unwrap();
    tds.bind(outer_ca, [Some(lower), None, None]).unwrap();
    tds.bind(outer_bd, [Some(upper), None, None]).unwrap();
    tds.bind(outer_dc, [Some(upper), None, None]).unwrap();
    assert!(tds.validate_neighbors().is_ok());

    let all = [lower, upper, outer_ab, outer_ca, outer_bd, outer_dc];
    let mut cache = SpatialCache::bootstrap(&tds, &all, &DelaunayConfig::default()).unwrap();
    let outer_before: Vec<_> = all[2..].iter().map(|&k| ids(&tds, k)).collect();
    let boundary_before = boundary_edges(&tds, lower, upper);
    assert_eq!(boundary_before.len(), 4);

    flip_edge(&mut tds, &mut cache, lower, 0).unwrap();

    assert_eq!(ids(&tds, lower), [1, 4, 3]);
    assert_eq!(ids(&tds, upper), [4, 1, 2]);
    let n = |k: TriangleKey| *tds.triangle(k).unwrap().neighbors();
    assert_eq!(n(lower), [Some(outer_dc), Some(outer_ca), Some(upper)]);
    assert_eq!(n(upper), [Some(outer_ab), Some(outer_bd), Some(lower)]);

    // Each outer triangle links back to whichever quad triangle now owns its edge.
    assert_eq!(tds.triangle(outer_dc).unwrap().neighbor(0), Some(lower));
    assert_eq!(tds.triangle(outer_ab).unwrap().neighbor(0), Some(upper));
    assert_eq!(tds.triangle(outer_ca).unwrap().neighbor(0), Some(lower));
    assert_eq!(tds.triangle(outer_bd).unwrap().neighbor(0), Some(upper));

    let quad_ids: FastHashSet<VertexId> = ids(&tds, lower)
        .into_iter()
        .chain(ids(&tds, upper))
        .collect();
    let expected: FastHashSet<VertexId> = [1, 2, 3, 4].into_iter().collect();
    assert_eq!(quad_ids, expected);
    let outer_after: Vec<_> = all[2..].iter().map(|&k| ids(&tds, k)).collect();
    assert_eq!(outer_after, outer_before);
    assert_eq!(boundary_edges(&tds, lower, upper), boundary_before);
    assert_eq!(tds.triangle(lower).unwrap().vertex_keys(), Some([a, d, c]));
    assert!(tds.validate_neighbors().is_ok());
    assert_eq!(cache.len(), 6);
}

#[test]
fn test_split_then_repair_keeps_cache_consistent() {
    let Quad {
        mut tds,
        mut cache,
        mut factory,
        lower,
        ..
    } = quad(1.0, vertex!(4, 0.0, 1.0));
    let before = cache.len();
    let split = split_inside(
        &mut tds,
        &mut cache,
        &mut factory,
        lower,
        vertex!(5, 0.0, -0.3),
    )
    .unwrap();
    assert_eq!(split.created.len(), 3);
    assert_eq!(cache.len(), before + 2);

    // The factory that built the quad keeps counting.
    let mut triangle_ids: Vec<_> = split
        .created
        .iter()
        .map(|&k| tds.triangle(k).unwrap().id())
        .collect();
    triangle_ids.sort_unstable();
    assert_eq!(triangle_ids, vec![1, 3, 4]);
    assert_eq!(factory.peek_next_id(), 5);
    assert_eq!(tds.vertex(split.vertex).map(Vertex::id), Some(5));

    repair_local(&mut tds, &mut cache, &split.created).unwrap();
    assert!(tds.validate_neighbors().is_ok());
    for &key in cache.triangles() {
        assert!(tds.is_valid_triangle(key));
    }
}
