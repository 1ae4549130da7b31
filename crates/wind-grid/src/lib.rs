//! Wind grid handling: from raw GRIB2 payloads to published grid datasets.
//!
//! - [`decoder`]: turns one forecast hour's GRIB2 payload into a [`DecodedRaster`]
//! - [`writer`]: serializes a raster into the text grid format
//! - [`reader`]: parses a grid file back, deriving wind speed and direction
//! - [`dataset`]: scratch assembly and publication of a whole model run

pub mod dataset;
pub mod decoder;
pub mod geotransform;
pub mod raster;
pub mod reader;
pub mod writer;

pub use dataset::{
    available_time_extent, dataset_age, DatasetDirectory, PublishOutcome, ScratchDataset, LABEL_FILE,
};
pub use decoder::{DecoderKind, GribCrateDecoder, NativeDecoder, RasterDecoder};
pub use raster::{DecodedRaster, Field2D, LevelFields};
pub use reader::{GridFile, GridHeader};
pub use writer::{grid_file_name, serialize};
