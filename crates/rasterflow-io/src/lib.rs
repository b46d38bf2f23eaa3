//! rasterflow-io: bulk image I/O for the rasterflow pipeline.
//!
//! The streaming core (`rasterflow-pipeline`) is sans-IO: it consumes
//! and produces in-memory pixel frames. This crate is the external
//! collaborator that connects those frames to the filesystem (raster
//! files via the `image` crate) and synthesizes the classic hardware
//! bring-up test patterns (gradient, checkerboard, edge grid).

pub mod patterns;
pub mod raster;

pub use raster::{RasterError, frame_from_image, image_from_frame, load_frame, save_frame};
