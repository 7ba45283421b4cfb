//! Core value types shared across the codec.

pub mod bounds;
pub mod color;
pub mod element_type;
pub mod properties;
pub mod rad50;
pub mod transform;
pub mod vector;

pub use bounds::{BoundingBox3D, UorExtents};
pub use color::{ColorTable, Rgb, DEFAULT_PALETTE};
pub use element_type::{has_display_header, type_to_name, ElementType};
pub use properties::{ElementProperties, IndexFlags};
pub use rad50::{ascii_to_rad50, rad50_to_ascii};
pub use transform::{rotation_to_quaternion, saturate, CoordinateTransform, UOR_LIMIT};
pub use vector::Vector3;
