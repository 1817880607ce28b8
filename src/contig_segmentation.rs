use std::sync::mpsc::channel;

use log::info;
use serde::Serialize;
use thousands::Separable;
use unwrap::unwrap;

use crate::errors::{Error, Result, bail_param};
use crate::kernel_segmentation::{KernelSegmenterSettings, find_changepoints_with_settings};

/// Ordered data points from one contig
pub struct ContigData<T> {
    pub label: String,
    pub values: Vec<T>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContigChangepoints {
    pub label: String,
    pub changepoints: Vec<usize>,
}

/// Segment each contig independently on a worker pool
///
/// Results are returned in the same order as `contigs`. Settings are validated once up front, so
/// an invalid setting fails before any contig is processed. `thread_count` must be at least 1.
///
pub fn segment_by_contig<T, K>(
    contigs: &[ContigData<T>],
    settings: &KernelSegmenterSettings,
    kernel: &K,
    thread_count: usize,
) -> Result<Vec<ContigChangepoints>>
where
    T: Sync,
    K: Fn(&T, &T) -> f64 + Sync,
{
    settings.validate()?;
    if thread_count == 0 {
        bail_param!("Thread count must be > 0");
    }

    let total_values = contigs.iter().map(|x| x.values.len()).sum::<usize>();
    info!(
        "Segmenting {} values from {} contigs",
        total_values.separate_with_commas(),
        contigs.len()
    );

    let worker_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .map_err(|e| Error::InvalidParameter(format!("Failed to start worker pool: {e}")))?;

    let (tx, rx) = channel();
    worker_pool.scope(move |scope| {
        for (contig_index, contig) in contigs.iter().enumerate() {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let result = find_changepoints_with_settings(&contig.values, kernel, settings);
                unwrap!(
                    tx.send((contig_index, result)),
                    "Result channel closed before contig '{}' finished",
                    contig.label
                );
            });
        }
    });

    let mut results = vec![None; contigs.len()];
    for (contig_index, result) in rx {
        results[contig_index] = Some(result);
    }

    let mut contig_changepoints = Vec::with_capacity(contigs.len());
    for (contig, result) in contigs.iter().zip(results) {
        let changepoints = unwrap!(result, "Missing result for contig '{}'", contig.label)?;
        info!(
            "Found {} changepoints in contig '{}'",
            changepoints.len().separate_with_commas(),
            contig.label
        );
        contig_changepoints.push(ContigChangepoints {
            label: contig.label.clone(),
            changepoints,
        });
    }
    Ok(contig_changepoints)
}
