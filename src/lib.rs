//! # dgnrust
//!
//! A pure Rust library for reading and writing Microstation DGN (v7) design
//! files.
//!
//! ## Features
//!
//! - Sequential and random access reading of 2D and 3D design files
//! - Decoding of lines, shapes, curves, arcs, ellipses, text, cells, complex
//!   groups, cones, B-spline records, tags, color tables and the TCB
//! - Spatial filtering and a lazily built element index with file extents
//! - Attribute linkages (database links, shape fill, association ids)
//! - Element factories, in-place rewriting and appending of elements
//! - New files from a seed file
//! - Arc and curve stroking into polylines
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dgnrust::{DgnFile, ElementKind};
//!
//! let mut dgn = DgnFile::open("drawing.dgn")?;
//! while let Some(element) = dgn.read_element()? {
//!     if let ElementKind::MultiPoint(mp) = &element.kind {
//!         println!("{}: {} vertices", element.core.type_name(), mp.vertices.len());
//!     }
//! }
//! println!("extents: {:?}", dgn.extents()?);
//! # Ok::<(), dgnrust::DgnError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`elements`] - the decoded element model: an [`ElementCore`] plus a
//!   typed [`ElementKind`] payload
//! - [`io::dgn`] - the codec: record framing, decoding, index and filter,
//!   linkages, writing and factories
//! - [`types`] - vectors, bounds, colors, flags and unit conversion
//! - [`stroke`] - polyline approximation of arcs and curves

#![allow(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod elements;
pub mod error;
pub mod io;
pub mod notification;
pub mod stroke;
pub mod types;

// Re-export commonly used types
pub use error::{DgnError, Result};
pub use types::{
    BoundingBox3D, ColorTable, CoordinateTransform, ElementProperties, ElementType, Rgb, Vector3,
};

// Re-export element types
pub use elements::{
    ArcElement, CellHeader, ComplexHeader, Element, ElementCore, ElementKind, MultiPoint,
    StructureType, TextElement,
};

// Re-export I/O types
pub use io::dgn::{CreationFlags, DgnFile, DgnReaderConfiguration, UnitSpec};
pub use notification::{Notification, NotificationCollection, NotificationType};
pub use stroke::{stroke_arc, stroke_curve};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
