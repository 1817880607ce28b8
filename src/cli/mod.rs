mod align;
mod segment;
mod shared;
mod utils;

use clap::{Parser, Subcommand};
use simple_error::SimpleResult;

use self::align::validate_and_fix_align_settings;
pub use self::align::AlignSettings;
use self::segment::validate_and_fix_segment_settings;
pub use self::segment::SegmentSettings;
use self::shared::validate_and_fix_shared_settings;
pub use self::shared::SharedSettings;

#[derive(Subcommand)]
pub enum Commands {
    /// Align a query sequence to a reference sequence
    Align(AlignSettings),

    /// Find changepoints in per-contig value sequences
    Segment(SegmentSettings),
}

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
#[clap(propagate_version = true, rename_all = "kebab_case")]
pub struct Settings {
    #[command(flatten)]
    pub shared: SharedSettings,

    #[command(subcommand)]
    pub command: Commands,
}

/// Validate settings and update parameters that can't be processed by clap
///
pub fn validate_and_fix_settings_impl(mut settings: Settings) -> SimpleResult<Settings> {
    settings.shared = validate_and_fix_shared_settings(settings.shared)?;

    settings.command = match settings.command {
        Commands::Align(x) => {
            let x = validate_and_fix_align_settings(x)?;
            Commands::Align(x)
        }
        Commands::Segment(x) => {
            let x = validate_and_fix_segment_settings(x)?;
            Commands::Segment(x)
        }
    };

    Ok(settings)
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes no logger has been configured yet
///
pub fn validate_and_fix_settings(settings: Settings) -> Settings {
    match validate_and_fix_settings_impl(settings) {
        Ok(x) => x,
        Err(msg) => {
            eprintln!("Invalid command-line setting: {msg}");
            std::process::exit(exitcode::USAGE);
        }
    }
}

pub fn parse_settings() -> Settings {
    Settings::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Settings::command().debug_assert();
    }

    #[test]
    fn test_validate_settings() {
        let settings = Settings::parse_from(["pairseg", "--threads", "3", "align", "--ref", "ACGT", "--query", "cg"]);
        let settings = validate_and_fix_settings_impl(settings).unwrap();
        assert_eq!(settings.shared.thread_count, 3);
        match settings.command {
            Commands::Align(x) => assert_eq!(x.query, "CG"),
            Commands::Segment(_) => panic!("Unexpected subcommand"),
        }

        let settings = Settings::parse_from(["pairseg", "segment", "--threads", "0"]);
        assert!(validate_and_fix_settings_impl(settings).is_err());
    }
}
