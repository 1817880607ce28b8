use clap::Args;
use pairseg::kernel_segmentation::{DEFAULT_SEED, KernelSegmenterSettings};
use regex::Regex;
use simple_error::{SimpleResult, bail, map_err_with};

use super::utils::check_optional_filename;

#[derive(Args)]
pub struct SegmentSettings {
    /// Input text file with one 'contig value' pair per line. Standard input is read if this is
    /// not specified.
    ///
    #[arg(long, value_name = "FILE")]
    pub input: Option<String>,

    /// Maximum number of changepoints reported per contig
    #[arg(long, default_value_t = 100)]
    pub max_changepoints: usize,

    /// Variance of the gaussian kernel used to compare values. Set to 0 to use a linear kernel,
    /// which only detects changes in the mean.
    ///
    #[arg(long, default_value_t = 0.0)]
    pub kernel_variance: f64,

    /// Number of values subsampled from each contig to build the kernel approximation
    #[arg(long, default_value_t = 100)]
    pub approximation_dimension: usize,

    /// Window size used to find changepoint candidates. Can be specified multiple times, all sizes
    /// must be unique.
    ///
    #[arg(long = "window-size", value_name = "SIZE", default_values_t = [8, 16, 32, 64])]
    pub window_sizes: Vec<usize>,

    /// Penalty per changepoint (must be 0 or >= 1)
    #[arg(long, default_value_t = 1.0)]
    pub linear_penalty: f64,

    /// Penalty per changepoint, scaled by log(value_count / changepoint_count) (must be 0 or >= 1)
    #[arg(long, default_value_t = 1.0)]
    pub log_linear_penalty: f64,

    /// Random seed for the kernel approximation subsample
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Only segment contigs with names matching this regex
    #[arg(long, value_name = "REGEX")]
    pub contig_regex: Option<String>,

    /// Compiled form of contig_regex, set during validation
    #[arg(skip)]
    pub contig_filter: Option<Regex>,
}

impl SegmentSettings {
    pub fn segmenter_settings(&self) -> KernelSegmenterSettings {
        KernelSegmenterSettings {
            max_changepoints: self.max_changepoints,
            approximation_dimension: self.approximation_dimension,
            window_sizes: self.window_sizes.clone(),
            linear_penalty: self.linear_penalty,
            log_linear_penalty: self.log_linear_penalty,
            seed: self.seed,
        }
    }
}

pub fn validate_and_fix_segment_settings(
    mut settings: SegmentSettings,
) -> SimpleResult<SegmentSettings> {
    check_optional_filename(settings.input.as_ref(), "input")?;

    if !(settings.kernel_variance.is_finite() && settings.kernel_variance >= 0.0) {
        bail!(
            "--kernel-variance must be 0 or a positive number, found {}",
            settings.kernel_variance
        );
    }

    if let Some(contig_regex) = &settings.contig_regex {
        let contig_filter =
            map_err_with!(Regex::new(contig_regex), "Invalid regex for --contig-regex")?;
        settings.contig_filter = Some(contig_filter);
    }

    if let Err(e) = settings.segmenter_settings().validate() {
        bail!("{}", e);
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        segment: SegmentSettings,
    }

    fn parse(args: &[&str]) -> SegmentSettings {
        TestCli::parse_from(std::iter::once("test").chain(args.iter().copied())).segment
    }

    #[test]
    fn test_segment_settings() {
        let settings = parse(&[]);
        assert_eq!(settings.segmenter_settings(), KernelSegmenterSettings::default());
        assert!(validate_and_fix_segment_settings(settings).is_ok());

        let settings = parse(&["--window-size", "5", "--window-size", "10", "--seed", "3"]);
        assert_eq!(settings.window_sizes, vec![5, 10]);
        assert_eq!(settings.segmenter_settings().seed, 3);
    }

    #[test]
    fn test_contig_regex_is_compiled_once() {
        let settings = parse(&[]);
        assert!(settings.contig_filter.is_none());
        let settings = validate_and_fix_segment_settings(settings).unwrap();
        assert!(settings.contig_filter.is_none());

        let settings = parse(&["--contig-regex", "^chr[0-9]+$"]);
        assert!(settings.contig_filter.is_none());
        let settings = validate_and_fix_segment_settings(settings).unwrap();
        let contig_filter = settings.contig_filter.as_ref().unwrap();
        assert!(contig_filter.is_match("chr12"));
        assert!(!contig_filter.is_match("chrX"));
    }

    #[test]
    fn test_invalid_segment_settings() {
        let settings = parse(&["--window-size", "8", "--window-size", "8"]);
        assert!(validate_and_fix_segment_settings(settings).is_err());

        let settings = parse(&["--linear-penalty", "0.5"]);
        assert!(validate_and_fix_segment_settings(settings).is_err());

        let settings = parse(&["--contig-regex", "chr("]);
        assert!(validate_and_fix_segment_settings(settings).is_err());

        let settings = parse(&["--input", "/nonexistent/pairseg/values.txt"]);
        assert!(validate_and_fix_segment_settings(settings).is_err());
    }
}
