use simple_error::{SimpleResult, bail};

/// Check an optional input filename
///
/// Assumes no logger has been configured yet
///
pub fn check_optional_filename(filename_opt: Option<&String>, label: &str) -> SimpleResult<()> {
    if let Some(filename) = filename_opt {
        let path = std::path::Path::new(&filename);
        if !path.exists() {
            bail!("Can't find specified {} file: '{}'", label, filename);
        }
        if !path.is_file() {
            bail!("Specified {} path is not a file: '{}'", label, filename);
        }
    }
    Ok(())
}

/// Check that a sequence argument is non-empty and contains only ASCII letters
///
/// Assumes no logger has been configured yet
///
pub fn check_sequence_arg(seq: &str, label: &str) -> SimpleResult<()> {
    if seq.is_empty() {
        bail!("Must specify a non-empty {} sequence", label);
    }
    if let Some(c) = seq.chars().find(|c| !c.is_ascii_alphabetic()) {
        bail!("Unexpected character '{}' in {} sequence", c, label);
    }
    Ok(())
}
