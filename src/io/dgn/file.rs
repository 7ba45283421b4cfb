//! Design file session: sequential and random access reading.

use super::decoder::ElementDecoder;
use super::filter::{raw_extents, SpatialFilter};
use super::index::{ElementIndex, IndexEntry};
use super::raw_reader::{RawHeader, RawRecordReader};
use super::state::SessionState;
use crate::elements::{Element, ElementKind, StructureType};
use crate::error::{DgnError, Result};
use crate::notification::{NotificationCollection, NotificationType};
use crate::types::{BoundingBox3D, ColorTable, CoordinateTransform, Rgb, Vector3};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Configuration for reading a design file.
#[derive(Debug, Clone, Default)]
pub struct DgnReaderConfiguration {
    /// Keep the complete record image on every decoded element, not only on
    /// elements the decoder does not interpret. Required for writing
    /// elements back.
    pub capture_raw_data: bool,
    /// When `true`, records that fail to decode are reported as
    /// notifications and skipped instead of ending the read with an error.
    ///
    /// Default: `false`
    pub failsafe: bool,
}

/// An open design file.
///
/// Read-only sessions come from [`DgnFile::open`] or [`DgnFile::from_stream`]
/// over any `Read + Seek` stream; writing (see the writer operations) needs a
/// stream that is also `Write`, e.g. [`DgnFile::open_for_update`].
pub struct DgnFile<S> {
    pub(crate) stream: S,
    pub(crate) reader: RawRecordReader,
    pub(crate) state: SessionState,
    pub(crate) config: DgnReaderConfiguration,
    pub(crate) notifications: NotificationCollection,
    pub(crate) filter: SpatialFilter,
    pub(crate) index: Option<ElementIndex>,
}

impl DgnFile<BufReader<File>> {
    /// Open a design file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_stream(BufReader::new(file))
    }
}

impl DgnFile<File> {
    /// Open a design file for reading and writing.
    pub fn open_for_update<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Self::from_stream(file)
    }
}

impl<S: Read + Seek> DgnFile<S> {
    /// Check the first bytes of a stream for a design file header.
    ///
    /// Fewer than four bytes are accepted. A cell library header is
    /// accepted as well as 2D and 3D design files.
    pub fn test_open(header: &[u8]) -> bool {
        if header.len() < 4 {
            return true;
        }
        if header[..4] == [0x08, 0x05, 0x17, 0x00] {
            return true;
        }
        (header[0] == 0x08 || header[0] == 0xc8)
            && header[1] == 0x09
            && header[2] == 0xfe
            && header[3] == 0x02
    }

    /// Start a session over a stream positioned anywhere; it is rewound.
    pub fn from_stream(mut stream: S) -> Result<Self> {
        stream.seek(SeekFrom::Start(0))?;
        let mut head = [0u8; 4];
        let got = read_prefix(&mut stream, &mut head)?;
        if !Self::test_open(&head[..got]) {
            return Err(DgnError::InvalidHeader(format!(
                "{:02X} {:02X} {:02X} {:02X} is not a design file header",
                head[0], head[1], head[2], head[3]
            )));
        }
        stream.seek(SeekFrom::Start(0))?;

        let dimension = if got > 0 && head[0] == 0xc8 { 3 } else { 2 };
        tracing::debug!(dimension, "opened design file");

        Ok(DgnFile {
            stream,
            reader: RawRecordReader::new(),
            state: SessionState::new(dimension),
            config: DgnReaderConfiguration::default(),
            notifications: NotificationCollection::new(),
            filter: SpatialFilter::default(),
            index: None,
        })
    }

    /// Set the reader configuration.
    pub fn with_config(mut self, config: DgnReaderConfiguration) -> Self {
        self.config = config;
        self
    }

    pub fn set_options(&mut self, config: DgnReaderConfiguration) {
        self.config = config;
    }

    pub fn config(&self) -> &DgnReaderConfiguration {
        &self.config
    }

    /// Only deliver elements whose range overlaps the rectangle (master
    /// units). An all-zero rectangle removes the filter.
    pub fn set_spatial_filter(&mut self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) {
        self.filter.set(min_x, min_y, max_x, max_y);
    }

    // ------------------------------------------------------------------
    // Sequential reading
    // ------------------------------------------------------------------

    /// Read the next element passing the spatial filter, `None` at the end
    /// of the file.
    pub fn read_element(&mut self) -> Result<Option<Element>> {
        loop {
            let offset = self.stream.stream_position()?;
            let Some(header) = self.reader.read_next(&mut self.stream)? else {
                return Ok(None);
            };

            if !self
                .filter
                .accept(self.reader.record(), &self.state.transform)
            {
                continue;
            }

            match self.decode_current(header) {
                Ok(mut element) => {
                    element.core.offset = Some(offset);
                    return Ok(Some(element));
                }
                Err(e) if self.config.failsafe => {
                    let id = self.reader.next_element_id() - 1;
                    self.notifications.notify_element(
                        NotificationType::Error,
                        id,
                        format!("skipping element: {}", e),
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Decode the record last read by the raw reader.
    fn decode_current(&mut self, header: RawHeader) -> Result<Element> {
        let element_id = self.reader.next_element_id() - 1;
        let element = ElementDecoder::new(
            &mut self.state,
            &mut self.notifications,
            self.config.capture_raw_data,
        )
        .with_element_id(element_id)
        .decode(self.reader.record(), header)?;

        if matches!(element.kind, ElementKind::Tcb(_)) {
            self.filter.invalidate_uor();
        }
        Ok(element)
    }

    /// Go back to the first element.
    pub fn rewind(&mut self) -> Result<()> {
        self.stream.seek(SeekFrom::Start(0))?;
        self.reader.set_next_element_id(0);
        self.filter.reset_group();
        Ok(())
    }

    /// Position the session so the next read returns element `element_id`.
    pub fn goto_element(&mut self, element_id: usize) -> Result<()> {
        self.build_index()?;
        let offset = self
            .index
            .as_ref()
            .and_then(|index| index.get(element_id))
            .map(|entry| entry.offset)
            .ok_or_else(|| {
                DgnError::InvalidArgument(format!("no element with id {}", element_id))
            })?;

        self.stream.seek(SeekFrom::Start(offset))?;
        self.reader.set_next_element_id(element_id);
        self.filter.reset_group();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Index and extents
    // ------------------------------------------------------------------

    /// Scan the whole file once, recording where every element lives.
    ///
    /// TCB and color table records are decoded on the way so session units
    /// and palette are known afterwards.
    pub fn build_index(&mut self) -> Result<()> {
        if self.index.is_some() {
            return Ok(());
        }

        self.rewind()?;
        let mut index = ElementIndex::new();
        loop {
            let offset = self.stream.stream_position()?;
            let header = match self.reader.read_next(&mut self.stream) {
                Ok(Some(header)) => header,
                Ok(None) => break,
                Err(e) => {
                    self.notifications.notify(
                        NotificationType::Error,
                        format!("index build stopped after {} elements: {}", index.len(), e),
                    );
                    break;
                }
            };

            let entry = index.push(offset, header, self.reader.record());
            if matches!(
                entry.structure_type,
                StructureType::ColorTable | StructureType::Tcb
            ) {
                if let Err(e) = self.decode_current(header) {
                    let id = index.len() - 1;
                    self.notifications
                        .notify_element(NotificationType::Error, id, e.to_string());
                }
            }
        }

        tracing::debug!(elements = index.len(), "built element index");
        self.index = Some(index);
        self.rewind()
    }

    /// Index entries in element id order, building the index if needed.
    pub fn element_index(&mut self) -> Result<&[IndexEntry]> {
        self.build_index()?;
        Ok(self.index.as_ref().map(|i| i.entries()).unwrap_or(&[]))
    }

    /// Number of elements in the file.
    pub fn element_count(&mut self) -> Result<usize> {
        Ok(self.element_index()?.len())
    }

    /// Range of all live top level elements, in master units.
    pub fn extents(&mut self) -> Result<Option<BoundingBox3D>> {
        self.build_index()?;
        let Some(ext) = self.index.as_ref().and_then(|i| i.extents()) else {
            return Ok(None);
        };
        let (min, max) = ext.unbiased();
        Ok(Some(BoundingBox3D::new(
            self.state.transform.to_master(Vector3::from_array(min)),
            self.state.transform.to_master(Vector3::from_array(max)),
        )))
    }

    /// Range of one element, in master units, for types that carry one.
    ///
    /// Uses the element's raw image, or the reader's buffer when the element
    /// is the one just read.
    pub fn element_extents(&self, element: &Element) -> Option<BoundingBox3D> {
        let record = if element.core.has_raw_data() {
            element.core.raw_data.as_slice()
        } else if element.core.element_id.is_some()
            && element.core.element_id == self.reader.next_element_id().checked_sub(1)
        {
            self.reader.record()
        } else {
            return None;
        };

        let (min, max) = raw_extents(element.core.element_type, record)?.unbiased();
        Some(BoundingBox3D::new(
            self.state.transform.to_master(Vector3::from_array(min)),
            self.state.transform.to_master(Vector3::from_array(max)),
        ))
    }

    // ------------------------------------------------------------------
    // Session state
    // ------------------------------------------------------------------

    /// Make sure the TCB has been read, scanning from the start if needed.
    ///
    /// Returns `false` when the file has none; units then stay at identity.
    pub fn load_tcb(&mut self) -> Result<bool> {
        if self.state.got_tcb {
            return Ok(true);
        }
        self.rewind()?;
        while !self.state.got_tcb {
            match self.read_element() {
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(e) => {
                    self.notifications
                        .notify(NotificationType::Warning, format!("while looking for TCB: {}", e));
                    break;
                }
            }
        }
        self.rewind()?;
        Ok(self.state.got_tcb)
    }

    /// Palette entry for a color index.
    pub fn lookup_color(&self, color: u8) -> Rgb {
        self.state.color_table.get(color)
    }

    pub fn color_table(&self) -> &ColorTable {
        &self.state.color_table
    }

    pub fn got_color_table(&self) -> bool {
        self.state.got_color_table
    }

    pub fn got_tcb(&self) -> bool {
        self.state.got_tcb
    }

    /// 2 or 3.
    pub fn dimension(&self) -> u8 {
        self.state.dimension
    }

    pub fn transform(&self) -> &CoordinateTransform {
        &self.state.transform
    }

    /// Master units per UOR.
    pub fn scale(&self) -> f64 {
        self.state.transform.scale
    }

    pub fn origin(&self) -> Vector3 {
        self.state.transform.origin
    }

    /// Diagnostics collected so far.
    pub fn notifications(&self) -> &NotificationCollection {
        &self.notifications
    }

    /// Close the session and hand back the stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

/// Read up to `buf.len()` bytes, returning how many were available.
fn read_prefix<R: Read>(stream: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match stream.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(total)
}
