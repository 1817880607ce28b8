//! Pairwise sequence alignment and kernel changepoint segmentation
//!
//! The crate provides two independent engines:
//!
//! - [sw_aligner]: a Smith-Waterman style aligner with affine gap costs and a choice of
//!   [OverhangStrategy] for the sequence ends.
//! - [kernel_segmentation]: changepoint detection in an ordered data sequence under any kernel
//!   function, with [contig_segmentation] running it over many independent contigs.
//!

pub mod alignment_result;
pub mod contig_segmentation;
pub mod errors;
pub mod kernel_segmentation;
pub mod sw_aligner;

pub use crate::alignment_result::{AlignmentOp, AlignmentResult};
pub use crate::errors::{Error, Result};
pub use crate::kernel_segmentation::{KernelSegmenterSettings, find_changepoints};
pub use crate::sw_aligner::{OverhangStrategy, SmithWatermanParameters, align};
