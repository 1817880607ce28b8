use clap::Args;
use pairseg::sw_aligner::{OverhangStrategy, SmithWatermanParameters};
use simple_error::{SimpleResult, bail};

use super::utils::check_sequence_arg;

const DEFAULT_PARAMS: SmithWatermanParameters = SmithWatermanParameters::ORIGINAL_DEFAULT;

#[derive(Args)]
pub struct AlignSettings {
    /// Reference sequence
    #[arg(long = "ref", value_name = "SEQ")]
    pub reference: String,

    /// Query sequence to align to the reference
    #[arg(long, value_name = "SEQ")]
    pub query: String,

    /// Method used to handle query sequence extending past either end of the reference, one of
    /// 'softclip', 'indel', 'leading-indel' or 'ignore'
    ///
    #[arg(long, default_value_t = OverhangStrategy::SoftClip)]
    pub strategy: OverhangStrategy,

    /// Score added for each matching base (must be >= 0)
    #[arg(long = "match", allow_negative_numbers = true, default_value_t = DEFAULT_PARAMS.match_value)]
    pub match_value: i32,

    /// Score added for each mismatching base (must be <= 0)
    #[arg(long, allow_negative_numbers = true, default_value_t = DEFAULT_PARAMS.mismatch_penalty)]
    pub mismatch: i32,

    /// Score added for the first base of a gap (must be <= 0)
    #[arg(long, allow_negative_numbers = true, default_value_t = DEFAULT_PARAMS.gap_open_penalty)]
    pub gap_open: i32,

    /// Score added for each gap base after the first (must be <= 0)
    #[arg(long, allow_negative_numbers = true, default_value_t = DEFAULT_PARAMS.gap_extend_penalty)]
    pub gap_extend: i32,

    /// Print a text rendering of the alignment to stderr
    #[arg(long)]
    pub print_alignment: bool,

    /// Always run the full alignment matrix, even when an exact query match is found
    ///
    /// This is intended for debugging only
    ///
    #[arg(hide = true, long)]
    pub disable_fast_path: bool,
}

impl AlignSettings {
    pub fn params(&self) -> SimpleResult<SmithWatermanParameters> {
        match SmithWatermanParameters::new(
            self.match_value,
            self.mismatch,
            self.gap_open,
            self.gap_extend,
        ) {
            Ok(x) => Ok(x),
            Err(e) => bail!("{}", e),
        }
    }
}

pub fn validate_and_fix_align_settings(mut settings: AlignSettings) -> SimpleResult<AlignSettings> {
    check_sequence_arg(&settings.reference, "reference")?;
    check_sequence_arg(&settings.query, "query")?;

    settings.reference.make_ascii_uppercase();
    settings.query.make_ascii_uppercase();

    settings.params()?;

    Ok(settings)
}
