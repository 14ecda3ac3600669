//! STL file I/O.
//!
//! Reading goes through [`StlReader`], which detects ASCII vs binary
//! encoding and streams triangles into any [`TriangleSink`]. Meshes are
//! written back either as binary STL or as ASCII STL.
//!
//! # Usage
//!
//! ```no_run
//! use stlmesh::io::{self, StlEncoding};
//! use stlmesh::mesh::TriangleMesh;
//!
//! let mesh: TriangleMesh = io::load("model.stl").unwrap();
//! io::save(&mesh, "copy.stl", StlEncoding::Ascii).unwrap();
//! ```
//!
//! [`TriangleSink`]: crate::mesh::TriangleSink

pub mod ascii;
pub mod stl;

use std::fmt;
use std::path::Path;

use crate::error::Result;
use crate::geom::Triangle;
use crate::mesh::{MeshIndex, TriangleMesh};

pub use ascii::AsciiOptions;
pub use stl::StlReader;

/// The two STL encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StlEncoding {
    /// Human-readable `solid ... endsolid` text.
    Ascii,
    /// 80-byte header, facet count, 50 bytes per facet.
    #[default]
    Binary,
}

impl fmt::Display for StlEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StlEncoding::Ascii => f.write_str("ascii"),
            StlEncoding::Binary => f.write_str("binary"),
        }
    }
}

/// Load an STL file and weld it into a mesh.
///
/// The encoding is detected from the file contents.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<TriangleMesh<I>> {
    stl::load(path)
}

/// Load an STL file as a plain triangle soup.
pub fn load_triangles<P: AsRef<Path>>(path: P) -> Result<Vec<Triangle>> {
    stl::load_triangles(path)
}

/// Save a mesh as STL.
///
/// ASCII output uses [`AsciiOptions::default`]; call [`ascii::save`] for
/// control over the solid name and number formatting.
pub fn save<P: AsRef<Path>, I: MeshIndex>(
    mesh: &TriangleMesh<I>,
    path: P,
    encoding: StlEncoding,
) -> Result<()> {
    match encoding {
        StlEncoding::Ascii => ascii::save(mesh, path, &AsciiOptions::default()),
        StlEncoding::Binary => stl::save_binary(mesh, path),
    }
}
