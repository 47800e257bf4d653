//! CU batch segmentation module.
//!
//! Pages are scanned for record headers, consecutive pages are grouped into
//! records, continuation segments sharing a tax code are merged, and the
//! recipient's tax code and name are extracted from each record.

mod boundary;
pub mod rules;
mod segmenter;

pub use boundary::{BoundaryDetector, HeaderStrategy};
pub use segmenter::{
    DocumentSegmenter, RawSegment, RecordSegmenter, RecordSources, SegmentationResult,
    merge_segments,
};
