use std::collections::HashMap;
use std::error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use log::info;
use pairseg::contig_segmentation::{ContigChangepoints, ContigData, segment_by_contig};
use pairseg::kernel_segmentation::{ChangepointSegments, gaussian_kernel, linear_kernel};
use regex::Regex;
use serde::Serialize;
use simple_error::bail;
use statrs::statistics::Statistics;
use thousands::Separable;

use crate::cli::SegmentSettings;

/// Read whitespace separated 'contig value' lines
///
/// Values are grouped by contig in the order each contig is first seen. Blank lines and lines
/// starting with '#' are skipped.
///
fn read_contig_values(
    reader: impl BufRead,
    contig_regex: Option<&Regex>,
) -> Result<Vec<ContigData<f64>>, Box<dyn error::Error>> {
    let mut contigs: Vec<ContigData<f64>> = Vec::new();
    let mut contig_index = HashMap::new();

    for (line_index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line_number = line_index + 1;
        let fields = line.split_whitespace().collect::<Vec<_>>();
        if fields.len() != 2 {
            bail!(
                "Expected 2 fields on input line {} but found {}: '{}'",
                line_number,
                fields.len(),
                line
            );
        }
        let (label, value) = (fields[0], fields[1]);

        if let Some(contig_regex) = contig_regex
            && !contig_regex.is_match(label)
        {
            continue;
        }

        let value = match value.parse::<f64>() {
            Ok(x) if x.is_finite() => x,
            _ => bail!("Invalid value '{}' on input line {}", value, line_number),
        };

        let index = *contig_index.entry(label.to_string()).or_insert_with(|| {
            contigs.push(ContigData {
                label: label.to_string(),
                values: Vec::new(),
            });
            contigs.len() - 1
        });
        contigs[index].values.push(value);
    }
    Ok(contigs)
}

#[derive(Serialize)]
struct SegmentOutput {
    begin: usize,
    end: usize,
    mean: f64,
}

#[derive(Serialize)]
struct ContigOutput {
    #[serde(flatten)]
    changepoints: ContigChangepoints,
    segments: Vec<SegmentOutput>,
}

fn get_segment_output(values: &[f64], changepoints: &[usize]) -> Vec<SegmentOutput> {
    ChangepointSegments::new(changepoints, values.len())
        .map(|(begin, end)| SegmentOutput {
            begin,
            end,
            mean: values[begin..=end].iter().mean(),
        })
        .collect()
}

pub fn run_segment(
    settings: &SegmentSettings,
    thread_count: usize,
) -> Result<(), Box<dyn error::Error>> {
    let contig_filter = settings.contig_filter.as_ref();

    let contigs = match &settings.input {
        Some(filename) => {
            info!("Reading contig values from '{filename}'");
            read_contig_values(BufReader::new(File::open(filename)?), contig_filter)?
        }
        None => {
            info!("Reading contig values from stdin");
            read_contig_values(io::stdin().lock(), contig_filter)?
        }
    };

    let value_count = contigs.iter().map(|x| x.values.len()).sum::<usize>();
    info!(
        "Read {} values from {} contigs",
        value_count.separate_with_commas(),
        contigs.len()
    );

    let segmenter_settings = settings.segmenter_settings();
    let contig_changepoints = if settings.kernel_variance == 0.0 {
        segment_by_contig(&contigs, &segmenter_settings, &linear_kernel, thread_count)?
    } else {
        let kernel = gaussian_kernel(settings.kernel_variance)?;
        segment_by_contig(&contigs, &segmenter_settings, &kernel, thread_count)?
    };

    let output = contigs
        .iter()
        .zip(contig_changepoints)
        .map(|(contig, changepoints)| ContigOutput {
            segments: get_segment_output(&contig.values, &changepoints.changepoints),
            changepoints,
        })
        .collect::<Vec<_>>();
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
