//! Microstation DGN (v7) codec.
//!
//! A design file is a flat sequence of variable length records ended by an
//! `FF FF` marker. [`DgnFile`] reads them sequentially or by element id,
//! decodes them into [`Element`](crate::elements::Element)s, and writes
//! raw element images back.
//!
//! ```rust,ignore
//! use dgnrust::io::dgn::DgnFile;
//!
//! let mut dgn = DgnFile::open("drawing.dgn")?;
//! while let Some(element) = dgn.read_element()? {
//!     println!("{}", element);
//! }
//! # Ok::<(), dgnrust::DgnError>(())
//! ```

pub mod cursor;
pub mod decoder;
pub mod factory;
pub mod file;
pub mod filter;
pub mod float;
pub mod index;
pub mod linkage;
pub mod raw_reader;
pub mod state;
pub mod writer;

pub use decoder::ElementDecoder;
pub use file::{DgnFile, DgnReaderConfiguration};
pub use float::{ieee_to_vax, vax_to_ieee};
pub use index::{ElementIndex, IndexEntry};
pub use linkage::{
    assoc_id, attr_link_size, get_linkage, linkage_type, linkages, shape_fill_color, Linkage,
};
pub use writer::{
    add_ms_link, add_raw_linkage, add_shape_fill_info, update_core_fields, update_element_core,
    write_bounds, CreationFlags, UnitSpec,
};
