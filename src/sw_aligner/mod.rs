//! Smith-Waterman style pairwise aligner with affine gap costs and configurable overhang handling
//!

mod dp_matrix;
mod traceback;

use bio::pattern_matching::horspool::Horspool;
use log::debug;
use serde::Serialize;
use strum::{Display, EnumString};

use self::dp_matrix::fill_alignment_matrices;
use self::traceback::trace_alignment;
use crate::alignment_result::{AlignmentOp, AlignmentResult};
use crate::errors::{Error, Result, bail_param};

/// Scoring scheme for the aligner
///
/// All values are added to the alignment score, so the match value is non-negative and all other
/// values are non-positive. A gap of length k scores `gap_open_penalty + (k-1) * gap_extend_penalty`.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SmithWatermanParameters {
    pub match_value: i32,
    pub mismatch_penalty: i32,
    pub gap_open_penalty: i32,
    pub gap_extend_penalty: i32,
}

impl SmithWatermanParameters {
    /// Historical default used for general purpose read to haplotype alignment
    pub const ORIGINAL_DEFAULT: Self = Self::new_unchecked(3, -1, -4, -3);

    /// Tuned for typical short-read sequencing error profiles
    pub const STANDARD_NGS: Self = Self::new_unchecked(25, -50, -110, -6);

    /// Stricter scheme favoring long gaps over clusters of mismatches
    pub const NEW_SW_PARAMETERS: Self = Self::new_unchecked(200, -150, -260, -11);

    /// Used when aligning reads back to their best supporting haplotype
    pub const ALIGNMENT_TO_BEST_HAPLOTYPE: Self = Self::new_unchecked(10, -15, -30, -5);

    const fn new_unchecked(
        match_value: i32,
        mismatch_penalty: i32,
        gap_open_penalty: i32,
        gap_extend_penalty: i32,
    ) -> Self {
        Self {
            match_value,
            mismatch_penalty,
            gap_open_penalty,
            gap_extend_penalty,
        }
    }

    pub fn new(
        match_value: i32,
        mismatch_penalty: i32,
        gap_open_penalty: i32,
        gap_extend_penalty: i32,
    ) -> Result<Self> {
        if match_value < 0 {
            bail_param!("Match value must be >= 0, found {match_value}");
        }
        if mismatch_penalty > 0 {
            bail_param!("Mismatch penalty must be <= 0, found {mismatch_penalty}");
        }
        if gap_open_penalty > 0 {
            bail_param!("Gap open penalty must be <= 0, found {gap_open_penalty}");
        }
        if gap_extend_penalty > 0 {
            bail_param!("Gap extend penalty must be <= 0, found {gap_extend_penalty}");
        }
        Ok(Self::new_unchecked(
            match_value,
            mismatch_penalty,
            gap_open_penalty,
            gap_extend_penalty,
        ))
    }

    /// True if an exact query match scores strictly above every other path through the same cells
    ///
    /// A zero match value or free gap opening allows clipped or gapped paths with an equal score,
    /// which the full traceback may prefer over the exact match.
    ///
    fn exact_match_is_strict_optimum(&self) -> bool {
        self.match_value > 0 && self.gap_open_penalty < 0
    }
}

/// How the unaligned ends of either sequence are treated
///
#[derive(Clone, Copy, Debug, Display, EnumString, PartialEq, Eq, Serialize)]
#[strum(ascii_case_insensitive)]
pub enum OverhangStrategy {
    /// Query overhangs become clip operations and are not scored
    #[strum(serialize = "softclip")]
    SoftClip,

    /// Overhangs on both ends are scored as regular insertions or deletions
    #[strum(serialize = "indel")]
    InDel,

    /// Leading overhangs are scored as insertions or deletions, trailing overhangs are free
    ///
    /// Useful when the query is not expected to reach the end of the reference, but leading
    /// indels are still relevant.
    #[strum(serialize = "leading-indel")]
    LeadingInDel,

    /// Overhangs are absorbed into the terminal match runs without clipping
    #[strum(serialize = "ignore")]
    Ignore,
}

impl OverhangStrategy {
    /// True if overhangs are never scored, which makes an exact substring match optimal
    fn has_free_overhangs(&self) -> bool {
        match self {
            Self::SoftClip | Self::Ignore => true,
            Self::InDel | Self::LeadingInDel => false,
        }
    }

    /// True if the matrix edges are initialized with gap costs
    fn scores_leading_overhang(&self) -> bool {
        match self {
            Self::InDel | Self::LeadingInDel => true,
            Self::SoftClip | Self::Ignore => false,
        }
    }
}

fn check_sequences(reference: &[u8], query: &[u8]) -> Result<()> {
    if reference.is_empty() || query.is_empty() {
        return Err(Error::InvalidInput(format!(
            "Non-empty sequences are required for alignment, found reference length {} and query length {}",
            reference.len(),
            query.len()
        )));
    }
    Ok(())
}

/// Find the start of the first occurrence of query in reference
///
/// The first occurrence ends closest to the matrix diagonal, so it is the one the full
/// dynamic-programming traceback selects among equal scores.
///
fn find_first_exact_match(reference: &[u8], query: &[u8]) -> Option<usize> {
    if query.len() > reference.len() {
        return None;
    }
    Horspool::new(query).find_all(reference).next()
}

/// Align query to reference
///
/// For the overhang strategies where overhangs are not scored, an exact substring match is
/// searched first and returned directly if found.
///
pub fn align(
    reference: &[u8],
    query: &[u8],
    params: &SmithWatermanParameters,
    strategy: OverhangStrategy,
) -> Result<AlignmentResult> {
    check_sequences(reference, query)?;

    if strategy.has_free_overhangs()
        && params.exact_match_is_strict_optimum()
        && let Some(match_index) = find_first_exact_match(reference, query)
    {
        return Ok(AlignmentResult {
            ref_offset: match_index as i64,
            ops: vec![AlignmentOp::Match(query.len() as u32)],
            score: params.match_value * query.len() as i32,
        });
    }

    align_without_fast_path(reference, query, params, strategy)
}

/// Align query to reference using the full dynamic-programming matrix in all cases
///
pub fn align_without_fast_path(
    reference: &[u8],
    query: &[u8],
    params: &SmithWatermanParameters,
    strategy: OverhangStrategy,
) -> Result<AlignmentResult> {
    check_sequences(reference, query)?;

    let matrices = fill_alignment_matrices(reference, query, params, strategy);
    let alignment = trace_alignment(&matrices, strategy);

    debug!(
        "Aligned query length {} to reference length {} with {strategy} overhangs: {alignment:?}",
        query.len(),
        reference.len()
    );

    Ok(alignment)
}

/// Common interface over pairwise aligner implementations
///
pub trait SmithWatermanAligner {
    fn align(&self, reference: &[u8], query: &[u8]) -> Result<AlignmentResult>;
}

/// Pairwise aligner with a fixed scoring scheme and overhang strategy
///
#[derive(Clone, Debug)]
pub struct DynamicProgrammingAligner {
    params: SmithWatermanParameters,
    strategy: OverhangStrategy,
}

impl DynamicProgrammingAligner {
    pub fn new(params: SmithWatermanParameters, strategy: OverhangStrategy) -> Self {
        Self { params, strategy }
    }

    pub fn params(&self) -> &SmithWatermanParameters {
        &self.params
    }

    pub fn strategy(&self) -> OverhangStrategy {
        self.strategy
    }
}

impl SmithWatermanAligner for DynamicProgrammingAligner {
    fn align(&self, reference: &[u8], query: &[u8]) -> Result<AlignmentResult> {
        align(reference, query, &self.params, self.strategy)
    }
}
