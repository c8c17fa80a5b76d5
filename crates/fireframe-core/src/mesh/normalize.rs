use super::Mesh;
use crate::geometry::Vec3;

/// Re-center on the bounding-box center and scale uniformly so the bounding
/// box diagonal (the bounding-sphere diameter) is 2.
///
/// Empty and zero-extent meshes are returned unchanged.
pub fn normalize(mesh: Mesh) -> Mesh {
    let Some(first) = mesh.vertices.first().copied() else {
        return mesh;
    };
    let (min, max) = mesh.vertices.iter().fold((first, first), |(lo, hi), v| {
        (
            Vec3::new(lo.x.min(v.x), lo.y.min(v.y), lo.z.min(v.z)),
            Vec3::new(hi.x.max(v.x), hi.y.max(v.y), hi.z.max(v.z)),
        )
    });
    let center = (min + max) * 0.5;
    let diameter = (max - min).length();
    tracing::debug!(?min, ?max, ?center, diameter, "mesh bounds");
    if diameter == 0.0 || !diameter.is_finite() {
        return mesh;
    }
    let scale = 2.0 / diameter;
    let vertices = mesh
        .vertices
        .iter()
        .map(|&v| (v - center) * scale)
        .collect();
    Mesh {
        vertices,
        lines: mesh.lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recenters_and_scales() {
        let m = Mesh::new(
            vec![Vec3::new(10.0, 10.0, 10.0), Vec3::new(12.0, 10.0, 10.0)],
            vec![[0, 1]],
        );
        let n = normalize(m);
        assert_eq!(n.vertices[0], Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(n.vertices[1], Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(n.lines, vec![[0, 1]]);
    }

    #[test]
    fn single_point_unchanged() {
        let m = Mesh::new(vec![Vec3::new(5.0, 5.0, 5.0)], vec![]);
        assert_eq!(normalize(m.clone()), m);
    }

    #[test]
    fn empty_unchanged() {
        assert_eq!(normalize(Mesh::empty()), Mesh::empty());
    }
}
