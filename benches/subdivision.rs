//! Benchmarks for refinement and tessellation.

use criterion::{criterion_group, criterion_main, Criterion};
use lathwork::algo::subdivide::refine_to_depth;
use lathwork::prelude::*;
use nalgebra::{Matrix4, Point3};

fn create_grid(n: usize) -> (Vec<Point3<f64>>, Vec<[usize; 4]>) {
    let mut points = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n);

    for j in 0..=n {
        for i in 0..=n {
            points.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            faces.push([v00, v00 + 1, v00 + n + 2, v00 + n + 1]);
        }
    }

    (points, faces)
}

fn bench_construction(c: &mut Criterion) {
    let (points, faces) = create_grid(32);

    c.bench_function("build_topology_32x32", |b| {
        b.iter(|| {
            let topo: Topology = build_from_polygons(&points, &faces).unwrap();
            topo
        });
    });
}

fn bench_refinement(c: &mut Criterion) {
    let (points, faces) = create_grid(8);

    c.bench_function("refine_all_facets_depth_3", |b| {
        b.iter(|| {
            let mut topo: Topology = build_from_polygons(&points, &faces).unwrap();
            let mut count = 0;
            for f in 0..topo.facet_count() {
                let face = topo.facet(FacetId::new(f)).unwrap();
                count += refine_to_depth(&mut topo, face, 3).unwrap().len();
            }
            count
        });
    });
}

fn bench_tessellation(c: &mut Criterion) {
    let (points, faces) = create_grid(8);
    let desc = MeshDescription::new(&faces).with_interpolate_boundary(true);
    let options = TessellateOptions::new(DiceOptions::new(Matrix4::new_scaling(16.0)));

    c.bench_function("tessellate_8x8_parallel", |b| {
        b.iter(|| {
            let slots = vec![TimeSlot::new(0.0, AttributeStore::new(points.clone()))];
            let mesh: SubdivisionMesh = SubdivisionMesh::new(&desc, slots).unwrap();
            tessellate(&mesh, &options).unwrap().grids.len()
        });
    });

    let sequential = TessellateOptions::new(DiceOptions::new(Matrix4::new_scaling(16.0)).sequential());
    c.bench_function("tessellate_8x8_sequential", |b| {
        b.iter(|| {
            let slots = vec![TimeSlot::new(0.0, AttributeStore::new(points.clone()))];
            let mesh: SubdivisionMesh = SubdivisionMesh::new(&desc, slots).unwrap();
            tessellate(&mesh, &sequential).unwrap().grids.len()
        });
    });
}

criterion_group!(benches, bench_construction, bench_refinement, bench_tessellation);
criterion_main!(benches);
