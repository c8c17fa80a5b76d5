//! Procedural wireframe shapes.
//!
//! Each generator returns raw, un-normalized geometry; sizes only need to be
//! right relative to each other within a shape.

use std::f64::consts::{PI, TAU};

use super::Mesh;
use crate::geometry::Vec3;

pub fn cube() -> Mesh {
    Mesh::from_flat(
        &[
            -1.0, -1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0, //
            -1.0, -1.0, 1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0, -1.0, 1.0, 1.0,
        ],
        vec![
            // front
            [0, 1], [1, 2], [2, 3], [3, 0],
            // back
            [4, 5], [5, 6], [6, 7], [7, 4],
            // sides
            [0, 4], [1, 5], [2, 6], [3, 7],
        ],
    )
}

/// Square base in the XY plane with the apex `height_ratio` along Z.
pub fn pyramid(height_ratio: f64) -> Mesh {
    Mesh::from_flat(
        &[
            -1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0, 1.0, 0.0, -1.0, 1.0, 0.0, 0.0, 0.0, height_ratio,
        ],
        vec![
            [0, 1], [1, 2], [2, 3], [3, 0],
            [0, 4], [1, 4], [2, 4], [3, 4],
        ],
    )
}

/// Ring torus whose outer radius is 1; `tube_ratio` is minor / major radius.
pub fn torus(tube_ratio: f64, major_segments: usize, minor_segments: usize) -> Mesh {
    let major_radius = 1.0 / (1.0 + tube_ratio);
    let minor_radius = major_radius * tube_ratio;
    let mut vertices = Vec::with_capacity(major_segments * minor_segments);
    let mut lines = Vec::with_capacity(2 * major_segments * minor_segments);

    for i in 0..major_segments {
        let (sin_theta, cos_theta) = (TAU * i as f64 / major_segments as f64).sin_cos();
        for j in 0..minor_segments {
            let (sin_phi, cos_phi) = (TAU * j as f64 / minor_segments as f64).sin_cos();
            let ring = major_radius + minor_radius * cos_phi;
            vertices.push(Vec3::new(ring * cos_theta, minor_radius * sin_phi, ring * sin_theta));

            let current = i * minor_segments + j;
            let next_j = i * minor_segments + (j + 1) % minor_segments;
            let next_i = ((i + 1) % major_segments) * minor_segments + j;
            lines.push([current, next_j]);
            lines.push([current, next_i]);
        }
    }
    Mesh::new(vertices, lines)
}

/// UV sphere: two poles plus `lat_segments - 1` rings of `lon_segments`.
pub fn sphere(lat_segments: usize, lon_segments: usize) -> Mesh {
    let mut vertices = vec![Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, -1.0, 0.0)];
    let mut lines = Vec::new();

    for lat in 1..lat_segments {
        let (sin_theta, cos_theta) = (PI * lat as f64 / lat_segments as f64).sin_cos();
        for lon in 0..lon_segments {
            let (sin_phi, cos_phi) = (TAU * lon as f64 / lon_segments as f64).sin_cos();
            vertices.push(Vec3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi));

            let ring = 2 + (lat - 1) * lon_segments;
            let current = ring + lon;
            lines.push([current, ring + (lon + 1) % lon_segments]);
            if lat + 1 < lat_segments {
                lines.push([current, current + lon_segments]);
            }
            if lat == 1 {
                lines.push([0, current]);
            }
            if lat + 1 == lat_segments {
                lines.push([1, current]);
            }
        }
    }
    Mesh::new(vertices, lines)
}

pub fn octahedron() -> Mesh {
    Mesh::from_flat(
        &[
            1.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
            0.0, -1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, -1.0,
        ],
        vec![
            [0, 2], [2, 4], [4, 0], [2, 1], [1, 4], [1, 5], [5, 2], [0, 5],
            [0, 3], [3, 4], [3, 1], [1, 3], [3, 5], [5, 0],
        ],
    )
}

pub fn icosahedron() -> Mesh {
    let phi = (1.0 + 5f64.sqrt()) / 2.0;
    let a = 1.0;
    let b = 1.0 / phi;
    let vertices = vec![
        Vec3::new(0.0, b, -a),
        Vec3::new(b, a, 0.0),
        Vec3::new(-b, a, 0.0),
        Vec3::new(0.0, b, a),
        Vec3::new(0.0, -b, a),
        Vec3::new(-a, 0.0, b),
        Vec3::new(0.0, -b, -a),
        Vec3::new(a, 0.0, -b),
        Vec3::new(a, 0.0, b),
        Vec3::new(-a, 0.0, -b),
        Vec3::new(b, -a, 0.0),
        Vec3::new(-b, -a, 0.0),
    ];
    let lines = vec![
        [0, 1], [0, 2], [0, 6], [0, 7], [0, 9],
        [1, 2], [1, 3], [1, 7], [1, 8],
        [2, 3], [2, 5], [2, 9],
        [3, 4], [3, 5], [3, 8],
        [4, 5], [4, 8], [4, 10], [4, 11],
        [5, 9], [5, 11],
        [6, 7], [6, 9], [6, 10], [6, 11],
        [7, 8], [7, 10],
        [8, 10],
        [9, 11],
        [10, 11],
    ];
    Mesh::new(vertices, lines)
}

/// Closed polyline sampled along `f(t)` for `t` in `[0, 2π)`.
fn closed_curve(segments: usize, f: impl Fn(f64) -> Vec3) -> Mesh {
    let vertices = (0..segments)
        .map(|i| f(TAU * i as f64 / segments as f64))
        .collect();
    let lines = (0..segments).map(|i| [i, (i + 1) % segments]).collect();
    Mesh::new(vertices, lines)
}

pub fn trefoil(segments: usize) -> Mesh {
    let size = 0.3;
    closed_curve(segments, |t| {
        Vec3::new(
            size * (t.sin() + 2.0 * (2.0 * t).sin()),
            size * (t.cos() - 2.0 * (2.0 * t).cos()),
            size * -(3.0 * t).sin(),
        )
    })
}

/// Möbius strip; the last ring joins the first flipped across the width.
pub fn mobius(width_ratio: f64, length_segments: usize, width_segments: usize) -> Mesh {
    let columns = width_segments + 1;
    let mut vertices = Vec::with_capacity(length_segments * columns);
    let mut lines = Vec::new();

    for i in 0..length_segments {
        let u = TAU * i as f64 / length_segments as f64;
        let (sin_u, cos_u) = u.sin_cos();
        let (sin_twist, cos_twist) = (u / 2.0).sin_cos();
        for j in 0..columns {
            let v = if width_segments == 0 {
                0.0
            } else {
                width_ratio * (j as f64 - width_segments as f64 / 2.0) / width_segments as f64
            };
            let r = 1.0 + v * cos_twist;
            vertices.push(Vec3::new(r * cos_u, r * sin_u, v * sin_twist));

            let current = i * columns + j;
            if j < width_segments {
                lines.push([current, current + 1]);
            }
            let next = if i + 1 < length_segments {
                (i + 1) * columns + j
            } else {
                width_segments - j
            };
            lines.push([current, next]);
        }
    }
    Mesh::new(vertices, lines)
}

/// Open helix along Y; `height_ratio` is total height over radius.
pub fn helix(turns: f64, height_ratio: f64, segments: usize) -> Mesh {
    if segments == 0 {
        return Mesh::empty();
    }
    let radius = 1.0 / (1.0 + height_ratio);
    let height = radius * height_ratio;
    let vertices = (0..=segments)
        .map(|i| {
            let f = i as f64 / segments as f64;
            let (sin_t, cos_t) = (turns * TAU * f).sin_cos();
            Vec3::new(radius * cos_t, height * f - height / 2.0, radius * sin_t)
        })
        .collect();
    let lines = (0..segments).map(|i| [i, i + 1]).collect();
    Mesh::new(vertices, lines)
}

/// 3D Lissajous curve with frequencies `(a, b, c)` and phases on X and Y.
pub fn lissajous(a: u32, b: u32, c: u32, delta_x: f64, delta_y: f64, segments: usize) -> Mesh {
    let (a, b, c) = (f64::from(a), f64::from(b), f64::from(c));
    closed_curve(segments, |t| {
        Vec3::new(
            (a * t + delta_x).sin(),
            (b * t + delta_y).sin(),
            (c * t).sin(),
        )
    })
}

/// Extruded star: outline front and back plus the connecting edges.
pub fn star(points: usize, inner_ratio: f64, depth_ratio: f64) -> Mesh {
    let n = points * 2;
    let outline = |z: f64| {
        (0..n).map(move |i| {
            let angle = PI * i as f64 / points as f64 - PI / 2.0;
            let r = if i % 2 == 0 { 1.0 } else { inner_ratio };
            Vec3::new(r * angle.cos(), r * angle.sin(), z)
        })
    };
    let vertices = outline(depth_ratio / 2.0)
        .chain(outline(-depth_ratio / 2.0))
        .collect();

    let mut lines = Vec::with_capacity(3 * n);
    lines.extend((0..n).map(|i| [i, (i + 1) % n]));
    lines.extend((0..n).map(|i| [n + i, n + (i + 1) % n]));
    lines.extend((0..n).map(|i| [i, n + i]));
    Mesh::new(vertices, lines)
}

/// The "no shape" entry.
pub fn none() -> Mesh {
    Mesh::empty()
}
