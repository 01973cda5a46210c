//! Vision layer: detection types, preprocessing, and annotation.

pub mod annotate;
pub mod ocr;
pub mod preprocess;
pub mod tesseract;

pub use annotate::{Annotator, BoxAnnotator, NullAnnotator};
pub use ocr::{Detection, DetectionLine, TextDetector};
pub use preprocess::{Preprocessor, SharpenFilter};
pub use tesseract::TesseractDetector;
