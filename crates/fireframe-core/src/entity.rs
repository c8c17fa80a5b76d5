//! Named drawable objects and the lazily loaded table that owns them.
//!
//! Each table slot pairs a descriptor (name plus where its mesh comes from)
//! with an initialize-once cell. The first access loads and normalizes the
//! mesh; concurrent first accesses block on the same initialization, so a
//! mesh is never loaded twice. A failed load is logged and remembered as
//! "nothing to draw" for that slot only.

use std::f64::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::geometry::Transform;
use crate::material::Material;
use crate::mesh::{self, Mesh, MeshError, generators, obj};

/// Initial projection scale relative to the smaller viewport side.
pub const INITIAL_SCALE_FACTOR: f64 = 1.2;

/// Name of the sentinel "no shape" entry, always last.
pub const NONE_SHAPE: &str = "none";

/// A mesh placed and styled in the scene.
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub mesh: Mesh,
    pub transform: Transform,
    pub material: Material,
}

impl Entity {
    /// Normalize `mesh` and derive a material from its line length.
    pub fn new(name: impl Into<String>, mesh: Mesh, scale: f64) -> Self {
        let name = name.into();
        let mesh = mesh::normalize(mesh);
        tracing::info!(
            entity = %name,
            vertices = mesh.vertices.len(),
            lines = mesh.lines.len(),
            "entity loaded"
        );
        let material = Material::for_mesh(&mesh);
        Self {
            name,
            mesh,
            transform: Transform {
                scale,
                ..Transform::default()
            },
            material,
        }
    }
}

/// Where a slot's mesh comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshSource {
    Generated(fn() -> Mesh),
    Embedded(&'static str),
    File(PathBuf),
}

impl MeshSource {
    pub fn load(&self) -> Result<Mesh, MeshError> {
        match self {
            Self::Generated(generate) => Ok(generate()),
            Self::Embedded(name) => obj::load_resource(name),
            Self::File(path) => obj::load_file(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    pub name: String,
    pub source: MeshSource,
}

impl EntityDescriptor {
    pub fn new(name: impl Into<String>, source: MeshSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }

    /// Descriptor for an OBJ file, named after its file stem.
    pub fn from_file(path: &Path) -> Self {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(name, MeshSource::File(path.to_path_buf()))
    }
}

/// Built-in shapes in cycling order, ending with [`NONE_SHAPE`].
pub fn builtin_descriptors() -> Vec<EntityDescriptor> {
    use MeshSource::{Embedded, Generated};
    vec![
        EntityDescriptor::new("cube", Generated(generators::cube)),
        EntityDescriptor::new("pyramid", Generated(|| generators::pyramid(1.5))),
        EntityDescriptor::new("torus", Generated(|| generators::torus(0.4, 24, 12))),
        EntityDescriptor::new("sphere", Generated(|| generators::sphere(12, 16))),
        EntityDescriptor::new("octahedron", Generated(generators::octahedron)),
        EntityDescriptor::new("icosahedron", Generated(generators::icosahedron)),
        EntityDescriptor::new("trefoil-knot", Generated(|| generators::trefoil(120))),
        EntityDescriptor::new("mobius-strip", Generated(|| generators::mobius(0.5, 32, 4))),
        EntityDescriptor::new("helix", Generated(|| generators::helix(3.0, 4.0, 80))),
        EntityDescriptor::new(
            "lissajous",
            Generated(|| generators::lissajous(3, 2, 5, PI / 2.0, 0.0, 150)),
        ),
        EntityDescriptor::new("star", Generated(|| generators::star(5, 0.4, 0.3))),
        EntityDescriptor::new("gem", Embedded("gem")),
        EntityDescriptor::new(NONE_SHAPE, Generated(generators::none)),
    ]
}

/// Descriptors plus one initialize-once slot each.
#[derive(Debug)]
pub struct EntityTable {
    descriptors: Vec<EntityDescriptor>,
    slots: Vec<OnceLock<Option<Entity>>>,
    initial_scale: f64,
}

impl EntityTable {
    pub fn new(descriptors: Vec<EntityDescriptor>, initial_scale: f64) -> Self {
        let slots = descriptors.iter().map(|_| OnceLock::new()).collect();
        Self {
            descriptors,
            slots,
            initial_scale,
        }
    }

    /// Built-ins with `external` inserted just before the "none" entry.
    pub fn with_external(external: &[PathBuf], initial_scale: f64) -> Self {
        let mut descriptors = builtin_descriptors();
        let at = descriptors.len().saturating_sub(1);
        descriptors.splice(at..at, external.iter().map(|p| EntityDescriptor::from_file(p)));
        Self::new(descriptors, initial_scale)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.descriptors.get(index).map(|d| d.name.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.name.as_str())
    }

    /// Case-insensitive lookup.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.descriptors
            .iter()
            .position(|d| d.name.eq_ignore_ascii_case(name))
    }

    /// Whether the slot has been initialized (successfully or not).
    pub fn is_loaded(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|s| s.get().is_some())
    }

    fn load(&self, index: usize) -> Option<Entity> {
        let desc = self.descriptors.get(index)?;
        match desc.source.load() {
            Ok(mesh) => Some(Entity::new(desc.name.clone(), mesh, self.initial_scale)),
            Err(err) => {
                tracing::warn!(entity = %desc.name, error = %err, "failed to load mesh; drawing nothing");
                None
            }
        }
    }

    /// Shared access, loading on first use. `None` for a failed load or an
    /// index out of range.
    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.slots
            .get(index)?
            .get_or_init(|| self.load(index))
            .as_ref()
    }

    /// Exclusive access, loading on first use.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.get(index)?;
        self.slots.get_mut(index)?.get_mut()?.as_mut()
    }
}
