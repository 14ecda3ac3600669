//! STL reading and binary STL writing.
//!
//! ASCII solids are tokenized here and read at full `f64` precision. Binary
//! records hold `f32` coordinates and are decoded by `stl_io`. On top of the
//! parsers this module adds encoding detection, header metadata (solid name,
//! facet count hint), conversion into [`Triangle`]s and streaming into a
//! [`TriangleSink`].

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, trace};
use nalgebra::{Point3, Vector3};

use super::StlEncoding;
use crate::error::{MeshError, Result};
use crate::geom::Triangle;
use crate::mesh::{MeshIndex, TriangleMesh, TriangleSink};

/// Length of the binary STL header, before the facet count.
const BINARY_HEADER_LEN: usize = 80;

/// Upper bound on facets reserved up front from an untrusted count.
const MAX_PREALLOCATED_FACETS: usize = 1 << 20;

/// Stored normals this far from the winding normal are reported.
const NORMAL_AGREEMENT: f64 = 0.99;

/// Streaming STL reader.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use stlmesh::io::{StlEncoding, StlReader};
///
/// let text = "solid demo\n\
///     facet normal 0 0 1\n\
///       outer loop\n\
///         vertex 0 0 0\n\
///         vertex 1 0 0\n\
///         vertex 0 1 0\n\
///       endloop\n\
///     endfacet\n\
///     endsolid demo\n";
///
/// let mut cursor = Cursor::new(text.as_bytes());
/// let mut reader = StlReader::new(&mut cursor).unwrap();
/// assert_eq!(reader.encoding(), StlEncoding::Ascii);
/// assert_eq!(reader.name(), "demo");
///
/// let triangles = reader.read_all().unwrap();
/// assert_eq!(triangles.len(), 1);
/// ```
pub struct StlReader<'a> {
    encoding: StlEncoding,
    name: String,
    expected_facets: usize,
    facets_read: usize,
    normal_mismatches: usize,
    facets: Facets<'a>,
}

impl<'a> StlReader<'a> {
    /// Probe the stream and prepare to read triangles from its start.
    pub fn new<R: Read + Seek>(read: &'a mut R) -> Result<Self> {
        let header = probe(read)?;
        read.seek(SeekFrom::Start(0))?;

        let facets = match header.encoding {
            StlEncoding::Ascii => Facets::Ascii(AsciiFacets::new(read)?),
            StlEncoding::Binary => Facets::Binary(Box::new(
                stl_io::BinaryStlReader::create_triangle_iterator(read).map_err(read_error)?,
            )),
        };

        debug!(
            "Opened {} STL solid {:?} with {} facets",
            header.encoding, header.name, header.expected_facets
        );

        Ok(Self {
            encoding: header.encoding,
            name: header.name,
            expected_facets: header.expected_facets,
            facets_read: 0,
            normal_mismatches: 0,
            facets,
        })
    }

    /// Detected encoding.
    pub fn encoding(&self) -> StlEncoding {
        self.encoding
    }

    /// Solid name from the ASCII `solid` line or the binary header.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Facet count announced by the file.
    ///
    /// For binary files this is the header count. For ASCII files it is the
    /// number of `facet` lines, counted during probing.
    pub fn expected_facet_count(&self) -> usize {
        self.expected_facets
    }

    /// Number of triangles returned so far.
    pub fn facets_read(&self) -> usize {
        self.facets_read
    }

    /// Number of facets whose stored normal disagreed with their winding.
    pub fn normal_mismatches(&self) -> usize {
        self.normal_mismatches
    }

    /// Read the next triangle, or `None` at the end of the solid.
    pub fn next_triangle(&mut self) -> Result<Option<Triangle>> {
        let Some(raw) = self.facets.next_facet()? else {
            return Ok(None);
        };

        let [a, b, c] = raw.vertices;
        let triangle = Triangle::new(a, b, c);

        if disagrees(&raw.normal, &triangle.normal()) {
            self.normal_mismatches += 1;
            trace!(
                "Facet {}: stored normal {:?} disagrees with winding",
                self.facets_read,
                raw.normal
            );
        }

        self.facets_read += 1;
        Ok(Some(triangle))
    }

    /// Read all remaining triangles.
    pub fn read_all(&mut self) -> Result<Vec<Triangle>> {
        let mut triangles = Vec::with_capacity(self.expected_facets.min(MAX_PREALLOCATED_FACETS));
        self.import_into(&mut triangles)?;
        Ok(triangles)
    }

    /// Push all remaining triangles into `sink`, then finish it.
    ///
    /// Returns the number of triangles pushed.
    pub fn import_into<S: TriangleSink + ?Sized>(&mut self, sink: &mut S) -> Result<usize> {
        let mut count = 0;
        while let Some(triangle) = self.next_triangle()? {
            sink.push_triangle(triangle)?;
            count += 1;
        }
        sink.finish()?;

        if self.facets_read != self.expected_facets {
            debug!(
                "Read {} facets, header announced {}",
                self.facets_read, self.expected_facets
            );
        }
        if self.normal_mismatches > 0 {
            debug!(
                "{} facets have stored normals disagreeing with their winding",
                self.normal_mismatches
            );
        }

        Ok(count)
    }
}

impl Iterator for StlReader<'_> {
    type Item = Result<Triangle>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_triangle().transpose()
    }
}

/// One facet as stored in the file.
struct RawFacet {
    normal: Vector3<f64>,
    vertices: [Point3<f64>; 3],
}

enum Facets<'a> {
    Ascii(AsciiFacets<'a>),
    Binary(Box<dyn Iterator<Item = std::io::Result<stl_io::Triangle>> + 'a>),
}

impl Facets<'_> {
    fn next_facet(&mut self) -> Result<Option<RawFacet>> {
        match self {
            Facets::Ascii(ascii) => ascii.next_facet(),
            Facets::Binary(triangles) => {
                let Some(raw) = triangles.next() else {
                    return Ok(None);
                };
                let raw = raw.map_err(read_error)?;
                Ok(Some(RawFacet {
                    normal: Vector3::new(
                        raw.normal[0] as f64,
                        raw.normal[1] as f64,
                        raw.normal[2] as f64,
                    ),
                    vertices: raw.vertices.map(|v| to_point(&v)),
                }))
            }
        }
    }
}

/// Line-based parser for the ASCII encoding.
///
/// Expects the stream positioned at the `solid` line. Coordinates are
/// parsed as `f64`, so anything written with [`crate::io::ascii`] reads
/// back bit-for-bit.
struct AsciiFacets<'a> {
    input: Box<dyn BufRead + 'a>,
    line: String,
    line_no: usize,
    done: bool,
}

impl<'a> AsciiFacets<'a> {
    fn new<R: Read + 'a>(read: &'a mut R) -> Result<Self> {
        let mut facets = Self {
            input: Box::new(BufReader::new(read)),
            line: String::new(),
            line_no: 0,
            done: false,
        };

        facets.require_line("solid")?;
        if facets.line.split_whitespace().next() != Some("solid") {
            return Err(facets.unexpected(&["solid"]));
        }
        Ok(facets)
    }

    fn next_facet(&mut self) -> Result<Option<RawFacet>> {
        if self.done {
            return Ok(None);
        }

        // A missing `endsolid` is tolerated
        if !self.read_line()? || self.line.split_whitespace().next() == Some("endsolid") {
            self.done = true;
            return Ok(None);
        }

        let normal = self.parse_vector(&["facet", "normal"])?;
        self.expect_line(&["outer", "loop"])?;

        let mut vertices = [Point3::origin(); 3];
        for v in &mut vertices {
            self.require_line("vertex")?;
            *v = Point3::from(self.parse_vector(&["vertex"])?);
        }

        self.expect_line(&["endloop"])?;
        self.expect_line(&["endfacet"])?;

        Ok(Some(RawFacet {
            normal: Vector3::from(normal),
            vertices,
        }))
    }

    /// Load the next non-blank line. Returns `false` at end of input.
    fn read_line(&mut self) -> Result<bool> {
        loop {
            self.line.clear();
            if self.input.read_line(&mut self.line).map_err(read_error)? == 0 {
                return Ok(false);
            }
            self.line_no += 1;
            if !self.line.trim().is_empty() {
                return Ok(true);
            }
        }
    }

    fn require_line(&mut self, expected: &str) -> Result<()> {
        if self.read_line()? {
            Ok(())
        } else {
            Err(MeshError::read(format!(
                "line {}: unexpected end of input, expected `{}`",
                self.line_no + 1,
                expected
            )))
        }
    }

    fn expect_line(&mut self, keywords: &[&str]) -> Result<()> {
        self.require_line(&keywords.join(" "))?;
        if self.line.split_whitespace().eq(keywords.iter().copied()) {
            Ok(())
        } else {
            Err(self.unexpected(keywords))
        }
    }

    /// Parse the current line as `<keywords> x y z`.
    fn parse_vector(&self, keywords: &[&str]) -> Result<[f64; 3]> {
        let mut tokens = self.line.split_whitespace();
        for &keyword in keywords {
            if tokens.next() != Some(keyword) {
                return Err(self.unexpected(keywords));
            }
        }

        let mut v = [0.0; 3];
        for c in &mut v {
            let token = tokens
                .next()
                .ok_or_else(|| self.malformed("expected three coordinates"))?;
            *c = token
                .parse::<f64>()
                .map_err(|e| self.malformed(format!("invalid number `{}`: {}", token, e)))?;
        }
        if let Some(extra) = tokens.next() {
            return Err(self.malformed(format!("unexpected token `{}`", extra)));
        }

        Ok(v)
    }

    fn unexpected(&self, keywords: &[&str]) -> MeshError {
        self.malformed(format!(
            "expected `{}`, found `{}`",
            keywords.join(" "),
            self.line.trim()
        ))
    }

    fn malformed<T: std::fmt::Display>(&self, message: T) -> MeshError {
        MeshError::read(format!("line {}: {}", self.line_no, message))
    }
}

struct Header {
    encoding: StlEncoding,
    name: String,
    expected_facets: usize,
}

/// ASCII files start with `solid ` followed by the name and a `facet` or
/// `endsolid` line. Binary exporters sometimes begin their 80-byte header
/// with `solid ` too, so a first line with non-ASCII bytes or a second line
/// that is neither means binary.
fn probe<R: Read + Seek>(read: &mut R) -> Result<Header> {
    read.seek(SeekFrom::Start(0))?;

    {
        let mut lines = BufReader::new(&mut *read);
        let mut first = Vec::new();
        lines.read_until(b'\n', &mut first)?;

        if first.starts_with(b"solid ") && first.is_ascii() {
            let mut rest = lines
                .split(b'\n')
                .filter(|line| !matches!(line, Ok(l) if l.trim_ascii().is_empty()));

            let second = rest.next().transpose()?;
            let is_ascii = match &second {
                None => true,
                Some(line) => {
                    let line = line.trim_ascii_start();
                    line.starts_with(b"facet") || line.starts_with(b"endsolid")
                }
            };

            if is_ascii {
                let name = String::from_utf8_lossy(&first[b"solid ".len()..])
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ");

                let mut expected_facets = 0;
                for line in second.into_iter().map(Ok).chain(rest) {
                    if line?.trim_ascii_start().starts_with(b"facet") {
                        expected_facets += 1;
                    }
                }

                return Ok(Header {
                    encoding: StlEncoding::Ascii,
                    name,
                    expected_facets,
                });
            }
        }
    }

    read.seek(SeekFrom::Start(0))?;
    let mut header = [0u8; BINARY_HEADER_LEN];
    read.read_exact(&mut header).map_err(read_error)?;
    let count = read.read_u32::<LittleEndian>().map_err(read_error)?;

    let end = header.iter().position(|&b| b == 0).unwrap_or(header.len());
    let name = String::from_utf8_lossy(&header[..end]).trim().to_string();

    Ok(Header {
        encoding: StlEncoding::Binary,
        name,
        expected_facets: count as usize,
    })
}

/// Malformed or truncated data is a read error; anything else is plain I/O.
fn read_error(err: std::io::Error) -> MeshError {
    match err.kind() {
        ErrorKind::InvalidData | ErrorKind::InvalidInput | ErrorKind::UnexpectedEof => {
            MeshError::read(err)
        }
        _ => MeshError::Io(err),
    }
}

fn to_point(v: &stl_io::Vertex) -> Point3<f64> {
    Point3::new(v[0] as f64, v[1] as f64, v[2] as f64)
}

fn disagrees(stored: &Vector3<f64>, computed: &Vector3<f64>) -> bool {
    match stored.try_normalize(f64::EPSILON) {
        // A zero stored normal means "compute it yourself"
        None => false,
        Some(_) if *computed == Vector3::zeros() => false,
        Some(n) => n.dot(computed) < NORMAL_AGREEMENT,
    }
}

/// Load an STL file and weld it into a mesh.
///
/// # Example
///
/// ```no_run
/// use stlmesh::io::stl;
/// use stlmesh::mesh::TriangleMesh;
///
/// let mesh: TriangleMesh = stl::load("model.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<TriangleMesh<I>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let mut reader = StlReader::new(&mut file).map_err(|e| load_error(path, e))?;
    let mut mesh =
        TriangleMesh::with_capacity(reader.expected_facet_count().min(MAX_PREALLOCATED_FACETS));
    reader
        .import_into(&mut mesh)
        .map_err(|e| load_error(path, e))?;

    debug!(
        "Loaded {}: {} facets, {} vertices",
        path.display(),
        mesh.num_facets(),
        mesh.num_vertices()
    );
    Ok(mesh)
}

/// Load an STL file as a plain triangle soup.
pub fn load_triangles<P: AsRef<Path>>(path: P) -> Result<Vec<Triangle>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    StlReader::new(&mut file)
        .and_then(|mut reader| reader.read_all())
        .map_err(|e| load_error(path, e))
}

/// Consistency violations keep their identity; input errors get the path.
fn load_error(path: &Path, err: MeshError) -> MeshError {
    match err {
        MeshError::Consistency(_) | MeshError::Io(_) => err,
        other => MeshError::LoadError {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    }
}

/// Write a mesh as binary STL.
///
/// Facets are written in order with their stored normals. Coordinates are
/// narrowed to `f32`.
pub fn write_binary<W: Write, I: MeshIndex>(mesh: &TriangleMesh<I>, writer: &mut W) -> Result<()> {
    let triangles: Vec<stl_io::Triangle> = mesh
        .facet_ids()
        .map(|f| {
            let [p0, p1, p2] = mesh.facet_triangle(f).points;
            let n = mesh.facet_normal(f);

            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    stl_io::Vertex::new([p0.x as f32, p0.y as f32, p0.z as f32]),
                    stl_io::Vertex::new([p1.x as f32, p1.y as f32, p1.z as f32]),
                    stl_io::Vertex::new([p2.x as f32, p2.y as f32, p2.z as f32]),
                ],
            }
        })
        .collect();

    stl_io::write_stl(writer, triangles.iter())?;
    Ok(())
}

/// Save a mesh to a binary STL file.
///
/// # Example
///
/// ```no_run
/// use stlmesh::io::stl;
/// use stlmesh::mesh::TriangleMesh;
///
/// let mesh: TriangleMesh = TriangleMesh::new();
/// stl::save_binary(&mesh, "output.stl").unwrap();
/// ```
pub fn save_binary<P: AsRef<Path>, I: MeshIndex>(mesh: &TriangleMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    write_binary(mesh, &mut writer)
        .and_then(|()| writer.flush().map_err(MeshError::from))
        .map_err(|e| MeshError::SaveError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}
