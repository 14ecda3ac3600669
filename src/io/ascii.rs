//! ASCII STL output.
//!
//! Every facet is written with its stored normal and its corners in
//! ingestion order:
//!
//! ```text
//! solid mesh
//!   facet normal 0 0 1
//!     outer loop
//!       vertex 0 0 0
//!       vertex 1 0 0
//!       vertex 0 1 0
//!     endloop
//!   endfacet
//! endsolid mesh
//! ```
//!
//! Numbers use the shortest representation that reads back to the same
//! `f64`, unless a fixed number of significant digits is requested.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::{MeshIndex, TriangleMesh};

/// Options for ASCII STL output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiOptions {
    /// Name written after `solid` and `endsolid`. Must be a non-empty single line.
    pub name: String,

    /// Significant digits per number; `None` writes the shortest exact form.
    pub precision: Option<usize>,
}

impl Default for AsciiOptions {
    fn default() -> Self {
        Self {
            name: "mesh".to_string(),
            precision: None,
        }
    }
}

impl AsciiOptions {
    /// Set the solid name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Write numbers with `digits` significant digits.
    pub fn with_precision(mut self, digits: usize) -> Self {
        self.precision = Some(digits);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(MeshError::invalid_param(
                "name",
                format!("{:?}", self.name),
                "solid name must not be empty",
            ));
        }
        if self.name.contains(['\n', '\r']) {
            return Err(MeshError::invalid_param(
                "name",
                format!("{:?}", self.name),
                "solid name must be a single line",
            ));
        }
        if self.precision == Some(0) {
            return Err(MeshError::invalid_param(
                "precision",
                0,
                "at least one significant digit is required",
            ));
        }
        Ok(())
    }
}

/// Write a mesh as ASCII STL.
pub fn write<W: Write, I: MeshIndex>(
    mesh: &TriangleMesh<I>,
    writer: &mut W,
    options: &AsciiOptions,
) -> Result<()> {
    options.validate()?;

    let mut adapter = IoAdapter {
        inner: writer,
        error: None,
    };
    match write_solid(mesh, &mut adapter, options) {
        Ok(()) => Ok(()),
        Err(fmt::Error) => Err(adapter
            .error
            .map(MeshError::Io)
            .unwrap_or_else(format_error)),
    }
}

/// Render a mesh as an ASCII STL string.
pub fn to_string<I: MeshIndex>(mesh: &TriangleMesh<I>, options: &AsciiOptions) -> Result<String> {
    options.validate()?;
    let mut out = String::new();
    write_solid(mesh, &mut out, options).map_err(|_| format_error())?;
    Ok(out)
}

/// Save a mesh to an ASCII STL file.
pub fn save<P: AsRef<Path>, I: MeshIndex>(
    mesh: &TriangleMesh<I>,
    path: P,
    options: &AsciiOptions,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    write(mesh, &mut writer, options)
        .and_then(|()| writer.flush().map_err(MeshError::from))
        .map_err(|e| match e {
            MeshError::InvalidParameter { .. } => e,
            other => MeshError::SaveError {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        })
}

/// A formatter failed without an underlying I/O error.
fn format_error() -> MeshError {
    MeshError::Io(std::io::Error::other("formatting failed"))
}

impl<I: MeshIndex> fmt::Display for TriangleMesh<I> {
    /// Formats the mesh as ASCII STL named `mesh`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_solid(self, f, &AsciiOptions::default())
    }
}

fn write_solid<I: MeshIndex, W: fmt::Write>(
    mesh: &TriangleMesh<I>,
    out: &mut W,
    options: &AsciiOptions,
) -> fmt::Result {
    let number = |out: &mut W, value: f64| -> fmt::Result {
        match options.precision {
            Some(digits) => out.write_str(&format_significant(value, digits)),
            None => write!(out, "{}", value),
        }
    };
    let triple = |out: &mut W, x: f64, y: f64, z: f64| -> fmt::Result {
        number(out, x)?;
        out.write_char(' ')?;
        number(out, y)?;
        out.write_char(' ')?;
        number(out, z)
    };

    writeln!(out, "solid {}", options.name)?;
    for f in mesh.facet_ids() {
        let n = mesh.facet_normal(f);
        out.write_str("  facet normal ")?;
        triple(out, n.x, n.y, n.z)?;
        out.write_str("\n    outer loop\n")?;
        for p in mesh.facet_triangle(f).points {
            out.write_str("      vertex ")?;
            triple(out, p.x, p.y, p.z)?;
            out.write_char('\n')?;
        }
        out.write_str("    endloop\n  endfacet\n")?;
    }
    writeln!(out, "endsolid {}", options.name)
}

/// Format like C's `%g`: `digits` significant digits, trailing zeros
/// dropped, scientific notation for very small or large magnitudes.
fn format_significant(value: f64, digits: usize) -> String {
    let digits = digits.max(1);
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let exponent = value.abs().log10().floor() as i64;
    if exponent < -5 || exponent >= digits as i64 {
        let formatted = format!("{:.*e}", digits - 1, value);
        match formatted.split_once('e') {
            Some((mantissa, exp)) => format!("{}e{}", trim_fraction(mantissa), exp),
            None => formatted,
        }
    } else {
        let decimals = (digits as i64 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Forwards formatted text to an `io::Write`, keeping the first I/O error.
struct IoAdapter<'a, W: Write> {
    inner: &'a mut W,
    error: Option<std::io::Error>,
}

impl<W: Write> fmt::Write for IoAdapter<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.inner.write_all(s.as_bytes()).map_err(|e| {
            self.error = Some(e);
            fmt::Error
        })
    }
}
