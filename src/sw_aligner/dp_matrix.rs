use super::{OverhangStrategy, SmithWatermanParameters};

/// Matrix cells are never allowed to drop below this score
///
/// This keeps long low-similarity alignments from accumulating without bound, and is far below
/// any score reachable by a meaningful alignment.
pub(super) const MATRIX_MIN_CUTOFF: i32 = -100_000_000;

/// Initial value for the running best-gap trackers
const LOW_INIT_VALUE: i32 = i32::MIN / 2;

/// Dense row-major matrix of alignment values
///
pub(super) struct DpMatrix {
    col_count: usize,
    data: Vec<i32>,
}

impl DpMatrix {
    fn new(row_count: usize, col_count: usize) -> Self {
        Self {
            col_count,
            data: vec![0; row_count * col_count],
        }
    }

    pub(super) fn row_count(&self) -> usize {
        self.data.len() / self.col_count
    }

    pub(super) fn col_count(&self) -> usize {
        self.col_count
    }

    #[inline]
    pub(super) fn get(&self, row: usize, col: usize) -> i32 {
        self.data[row * self.col_count + col]
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, value: i32) {
        self.data[row * self.col_count + col] = value;
    }
}

/// Score and backtrack matrices from the alignment fill step
///
/// Both matrices have one row per reference position and one column per query position, plus a
/// leading row and column for the empty prefix.
///
/// Backtrack values are encoded as:
/// - 0: diagonal step
/// - -k: horizontal gap (insertion) of length k ending at this cell
/// - +k: vertical gap (deletion) of length k ending at this cell
///
pub(super) struct AlignmentMatrices {
    pub score: DpMatrix,
    pub backtrack: DpMatrix,
}

/// Set leading edge cells to the affine cost of a gap covering the edge up to that point
fn init_gap_edges(score: &mut DpMatrix, params: &SmithWatermanParameters) {
    let mut value = params.gap_open_penalty;
    for col in 1..score.col_count() {
        score.set(0, col, value);
        value = value.saturating_add(params.gap_extend_penalty);
    }

    let mut value = params.gap_open_penalty;
    for row in 1..score.row_count() {
        score.set(row, 0, value);
        value = value.saturating_add(params.gap_extend_penalty);
    }
}

/// Fill the alignment score and backtrack matrices
///
/// Gap scores are tracked incrementally: for each column the best vertical gap reaching the current
/// row is either the previous best extended by one, or a new gap opened from the cell above. The
/// same is done for horizontal gaps along each row. This is exact only for the affine gap model.
///
/// When several moves reach the same score, the diagonal move is preferred, followed by the
/// horizontal gap and then the vertical gap.
///
pub(super) fn fill_alignment_matrices(
    reference: &[u8],
    query: &[u8],
    params: &SmithWatermanParameters,
    strategy: OverhangStrategy,
) -> AlignmentMatrices {
    let row_count = reference.len() + 1;
    let col_count = query.len() + 1;

    let mut score = DpMatrix::new(row_count, col_count);
    let mut backtrack = DpMatrix::new(row_count, col_count);

    if strategy.scores_leading_overhang() {
        init_gap_edges(&mut score, params);
    }

    let wm = params.match_value;
    let wx = params.mismatch_penalty;
    let wo = params.gap_open_penalty;
    let we = params.gap_extend_penalty;

    let mut best_gap_v = vec![LOW_INIT_VALUE; col_count];
    let mut gap_size_v = vec![0i32; col_count];

    for (row, &ref_base) in reference.iter().enumerate().map(|(i, b)| (i + 1, b)) {
        let mut best_gap_h = LOW_INIT_VALUE;
        let mut gap_size_h = 0i32;

        for (col, &query_base) in query.iter().enumerate().map(|(j, b)| (j + 1, b)) {
            let step_diag = score
                .get(row - 1, col - 1)
                .saturating_add(if ref_base == query_base { wm } else { wx });

            let open_gap_v = score.get(row - 1, col).saturating_add(wo);
            best_gap_v[col] = best_gap_v[col].saturating_add(we);
            if open_gap_v > best_gap_v[col] {
                best_gap_v[col] = open_gap_v;
                gap_size_v[col] = 1;
            } else {
                gap_size_v[col] += 1;
            }
            let step_down = best_gap_v[col];

            let open_gap_h = score.get(row, col - 1).saturating_add(wo);
            best_gap_h = best_gap_h.saturating_add(we);
            if open_gap_h > best_gap_h {
                best_gap_h = open_gap_h;
                gap_size_h = 1;
            } else {
                gap_size_h += 1;
            }
            let step_right = best_gap_h;

            let (value, bt) = if step_diag >= step_down && step_diag >= step_right {
                (step_diag, 0)
            } else if step_right >= step_down {
                (step_right, -gap_size_h)
            } else {
                (step_down, gap_size_v[col])
            };

            score.set(row, col, value.max(MATRIX_MIN_CUTOFF));
            backtrack.set(row, col, bt);
        }
    }

    AlignmentMatrices { score, backtrack }
}
