use super::OverhangStrategy;
use super::dp_matrix::AlignmentMatrices;
use crate::alignment_result::{AlignmentOp, AlignmentResult, consolidate_ops};

#[derive(Clone, Copy, PartialEq, Eq)]
enum TraceState {
    Match,
    Insert,
    Delete,
}

impl TraceState {
    fn to_op(self, len: usize) -> AlignmentOp {
        let len = len as u32;
        match self {
            Self::Match => AlignmentOp::Match(len),
            Self::Insert => AlignmentOp::Insert(len),
            Self::Delete => AlignmentOp::Delete(len),
        }
    }
}

/// Cell where the traceback begins
struct TracebackStart {
    row: usize,
    col: usize,

    /// Query positions after `col` which are not part of the aligned path
    trailing_query_overhang: usize,
}

/// Select the traceback start cell according to the overhang strategy
///
/// Except for the indel strategy, the rightmost column is scanned for the best score, ties going
/// to the cell closest to the diagonal. When trailing overhangs are free, the bottom row is also
/// scanned for a better score, or an equal score closer to the diagonal.
///
fn find_traceback_start(matrices: &AlignmentMatrices, strategy: OverhangStrategy) -> TracebackStart {
    let score = &matrices.score;
    let ref_len = score.row_count() - 1;
    let query_len = score.col_count() - 1;

    if strategy == OverhangStrategy::InDel {
        return TracebackStart {
            row: ref_len,
            col: query_len,
            trailing_query_overhang: 0,
        };
    }

    let mut start = TracebackStart {
        row: 0,
        col: query_len,
        trailing_query_overhang: 0,
    };
    let mut max_score = i32::MIN;
    for row in 1..=ref_len {
        let s = score.get(row, query_len);
        if s > max_score
            || (s == max_score && row.abs_diff(query_len) < start.row.abs_diff(query_len))
        {
            start.row = row;
            max_score = s;
        }
    }

    if strategy != OverhangStrategy::LeadingInDel {
        for col in 1..=query_len {
            let s = score.get(ref_len, col);
            if s > max_score
                || (s == max_score && ref_len.abs_diff(col) < start.row.abs_diff(start.col))
            {
                start = TracebackStart {
                    row: ref_len,
                    col,
                    trailing_query_overhang: query_len - col,
                };
                max_score = s;
            }
        }
    }

    start
}

/// Convert filled alignment matrices into the alignment result
///
/// Operations are accumulated from the end of the alignment and reversed once the traceback
/// reaches the first row or column.
///
pub(super) fn trace_alignment(
    matrices: &AlignmentMatrices,
    strategy: OverhangStrategy,
) -> AlignmentResult {
    let start = find_traceback_start(matrices, strategy);
    let score = matrices.score.get(start.row, start.col);

    let mut row = start.row;
    let mut col = start.col;
    let mut segment_length = start.trailing_query_overhang;

    let mut ops = Vec::new();
    if strategy == OverhangStrategy::SoftClip && segment_length > 0 {
        ops.push(AlignmentOp::Clip(segment_length as u32));
        segment_length = 0;
    }

    // Any trailing overhang not clipped above is counted in the final match run
    let mut state = TraceState::Match;
    loop {
        let bt = matrices.backtrack.get(row, col);
        let (new_state, step_length) = match bt.signum() {
            1 => (TraceState::Delete, bt as usize),
            -1 => (TraceState::Insert, (-bt) as usize),
            _ => (TraceState::Match, 1),
        };

        match new_state {
            TraceState::Match => {
                row -= 1;
                col -= 1;
            }
            TraceState::Insert => col -= step_length,
            TraceState::Delete => row -= step_length,
        }

        if new_state == state {
            segment_length += step_length;
        } else {
            ops.push(state.to_op(segment_length));
            segment_length = step_length;
            state = new_state;
        }

        if row == 0 || col == 0 {
            break;
        }
    }

    // At most one of row and col is non-zero here, and it gives the leading overhang
    let ref_offset = match strategy {
        OverhangStrategy::SoftClip => {
            ops.push(state.to_op(segment_length));
            if col > 0 {
                ops.push(AlignmentOp::Clip(col as u32));
            }
            row as i64
        }
        OverhangStrategy::Ignore => {
            if state == TraceState::Match {
                ops.push(state.to_op(segment_length + col));
            } else {
                ops.push(state.to_op(segment_length));
                ops.push(AlignmentOp::Match(col as u32));
            }
            row as i64 - col as i64
        }
        OverhangStrategy::InDel | OverhangStrategy::LeadingInDel => {
            ops.push(state.to_op(segment_length));
            if row > 0 {
                ops.push(AlignmentOp::Delete(row as u32));
            } else if col > 0 {
                ops.push(AlignmentOp::Insert(col as u32));
            }
            0
        }
    };

    ops.reverse();
    AlignmentResult {
        ref_offset,
        ops: consolidate_ops(ops),
        score,
    }
}
