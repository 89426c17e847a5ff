//! Image sorting pipeline components.
//!
//! - **discovery**: Find candidate images under an input root
//! - **validate**: Size and magic-byte checks before decoding
//! - **decode**: Load and decode images from various formats
//! - **driver**: Runs a whole sort, one bounded task per image

pub mod decode;
pub mod discovery;
pub mod driver;
pub mod validate;

pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredImage, FileDiscovery};
pub use driver::{DriverState, ImageStage, PipelineDriver};
pub use validate::Validator;
