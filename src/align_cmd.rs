use std::error;

use log::info;
use pairseg::alignment_result::{AlignmentResult, format_pairwise_alignment};
use pairseg::sw_aligner::{
    DynamicProgrammingAligner, OverhangStrategy, SmithWatermanAligner, align_without_fast_path,
};
use serde::Serialize;

use crate::cli::AlignSettings;

/// Width of each block in the text alignment rendering
const ALIGNMENT_PRINT_WIDTH: usize = 100;

#[derive(Serialize)]
struct AlignOutput<'a> {
    strategy: OverhangStrategy,
    cigar: String,

    #[serde(flatten)]
    alignment: &'a AlignmentResult,
}

pub fn run_align(settings: &AlignSettings) -> Result<(), Box<dyn error::Error>> {
    let params = settings.params()?;
    let reference = settings.reference.as_bytes();
    let query = settings.query.as_bytes();

    info!(
        "Aligning query length {} to reference length {} with {} overhangs",
        query.len(),
        reference.len(),
        settings.strategy
    );

    let alignment = if settings.disable_fast_path {
        align_without_fast_path(reference, query, &params, settings.strategy)?
    } else {
        DynamicProgrammingAligner::new(params, settings.strategy).align(reference, query)?
    };

    info!(
        "Alignment score: {} ref_offset: {} cigar: {alignment}",
        alignment.score, alignment.ref_offset
    );

    if settings.print_alignment {
        eprint!(
            "{}",
            format_pairwise_alignment(&alignment, reference, query, ALIGNMENT_PRINT_WIDTH)
        );
    }

    let output = AlignOutput {
        strategy: settings.strategy,
        cigar: alignment.to_string(),
        alignment: &alignment,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
