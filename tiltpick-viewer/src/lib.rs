//! tiltpick-viewer: Tilt-series selection bound to an image viewer.
//!
//! The [`Selector`] holds the metadata documents and candidate image files a
//! user has chosen and pushes the ordered, lazily evaluated tilt series into
//! an image layer of any [`Viewer`] implementation.
//!

mod error;
pub mod layer;
pub mod list;
pub mod selector;
pub mod viewer;

pub use error::{Error, Result};
pub use layer::{ImageLayer, LayerData, LayerId};
pub use list::{ListEvent, SelectableList};
pub use selector::{Selector, NORMALISED_CONTRAST_RANGE};
pub use viewer::{HeadlessViewer, Viewer};
