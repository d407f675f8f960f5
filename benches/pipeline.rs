use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use knotview::bench::{EdgeFunctionRasterizer, FragmentShader, FrameBuffer, ScreenVertex, Varyings};
use knotview::prelude::*;

const BUFFER_WIDTH: u32 = 800;
const BUFFER_HEIGHT: u32 = 800;

struct Solid;

impl FragmentShader for Solid {
    fn shade(&self, _varyings: &Varyings) -> u32 {
        0xFFFF_0000
    }
}

fn screen(x: f32, y: f32) -> ScreenVertex {
    ScreenVertex::new(x, y, 1.0, &Varyings::default())
}

fn benchmark_surface_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("surface");
    let params = SurfaceParams::default();

    group.bench_function("vertices", |b| b.iter(|| black_box(&params).generate_vertices()));
    group.bench_function("normals", |b| b.iter(|| black_box(&params).generate_normals()));

    for connectivity in [Connectivity::Raw, Connectivity::Stitched] {
        let options = MeshOptions {
            connectivity,
            ..MeshOptions::default()
        };
        group.bench_with_input(
            BenchmarkId::new("mesh", format!("{connectivity:?}")),
            &options,
            |b, options| b.iter(|| SurfaceMesh::build(black_box(&params), *options)),
        );
    }

    group.finish();
}

fn benchmark_triangles(c: &mut Criterion) {
    let mut group = c.benchmark_group("edge_function");
    let raster = EdgeFunctionRasterizer::new();

    for (name, size) in [("small", 20.0), ("medium", 200.0), ("large", 700.0)] {
        let (a, b2, c2) = (screen(50.0, 50.0), screen(50.0 + size, 50.0), screen(50.0, 50.0 + size));
        group.bench_function(BenchmarkId::new("triangle", name), |b| {
            let mut color = vec![0u32; (BUFFER_WIDTH * BUFFER_HEIGHT) as usize];
            let mut depth = vec![0.0f32; (BUFFER_WIDTH * BUFFER_HEIGHT) as usize];
            b.iter(|| {
                depth.fill(0.0);
                let mut fb = FrameBuffer::new(&mut color, &mut depth, BUFFER_WIDTH, BUFFER_HEIGHT);
                raster.fill_triangle(black_box([&a, &b2, &c2]), &mut fb, &Solid, true)
            });
        });
    }

    group.finish();
}

fn benchmark_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    group.sample_size(10);

    for connectivity in [Connectivity::Raw, Connectivity::Stitched] {
        let config = AppConfig {
            connectivity,
            ..AppConfig::default()
        };
        let mut app = match App::new(&config) {
            Ok(app) => app,
            Err(e) => panic!("app init failed: {e}"),
        };
        group.bench_function(format!("{connectivity:?}"), |b| b.iter(|| app.draw()));
    }

    group.finish();
}

criterion_group!(benches, benchmark_surface_generation, benchmark_triangles, benchmark_frame);
criterion_main!(benches);
