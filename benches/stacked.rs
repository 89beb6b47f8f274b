use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kurbo::Point;

use overpaint::{Ellipse, InputShape, OverlayKernel, Primitive, Stack};

// A fan of overlapping ellipses, like the petals of a flower.
fn petals(n: usize) -> Vec<InputShape> {
    (0..n)
        .map(|i| {
            let theta = std::f64::consts::TAU * i as f64 / n as f64;
            InputShape::new(Primitive::Ellipse(Ellipse {
                cx: 20.0 * theta.cos(),
                cy: 20.0 * theta.sin(),
                rx: 15.0,
                ry: 8.0,
            }))
        })
        .collect()
}

// A grid of squares, each overlapping its neighbors.
fn tiles(n: usize) -> Vec<InputShape> {
    let mut ret = Vec::new();
    for i in 0..n {
        for j in 0..n {
            let (x, y) = (i as f64 * 7.0, j as f64 * 7.0);
            ret.push(InputShape::new(Primitive::Contour(vec![
                Point::new(x, y),
                Point::new(x + 10.0, y),
                Point::new(x + 10.0, y + 10.0),
                Point::new(x, y + 10.0),
            ])));
        }
    }
    ret
}

fn flatten(c: &mut Criterion) {
    let kernel = OverlayKernel::default();

    let petals = Stack::from_drawing(petals(24)).unwrap();
    c.bench_function("petals", |b| {
        b.iter(|| black_box(petals.clone().flatten(&kernel).unwrap()))
    });

    let tiles = Stack::from_drawing(tiles(6)).unwrap();
    c.bench_function("tiles", |b| {
        b.iter(|| black_box(tiles.clone().flatten(&kernel).unwrap()))
    });
}

criterion_group!(benches, flatten);
criterion_main!(benches);
