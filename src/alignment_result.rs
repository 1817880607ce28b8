use std::fmt;

use rust_htslib::bam::record::{Cigar, CigarString};
use serde::Serialize;

use crate::sw_aligner::SmithWatermanParameters;

/// One run of a pairwise alignment edit path, described relative to the reference
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AlignmentOp {
    /// Aligned positions in both sequences, either matching or mismatching
    Match(u32),

    /// Query positions absent from the reference
    Insert(u32),

    /// Reference positions absent from the query
    Delete(u32),

    /// Unaligned query positions at either end, not scored
    Clip(u32),
}

impl AlignmentOp {
    pub fn len(&self) -> u32 {
        use AlignmentOp::*;
        match self {
            Match(len) | Insert(len) | Delete(len) | Clip(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of query positions consumed by this operation
    pub fn query_len(&self) -> u32 {
        use AlignmentOp::*;
        match self {
            Match(len) | Insert(len) | Clip(len) => *len,
            Delete(_) => 0,
        }
    }

    /// Number of reference positions consumed by this operation
    pub fn ref_len(&self) -> u32 {
        use AlignmentOp::*;
        match self {
            Match(len) | Delete(len) => *len,
            Insert(_) | Clip(_) => 0,
        }
    }

    fn with_len(&self, len: u32) -> Self {
        use AlignmentOp::*;
        match self {
            Match(_) => Match(len),
            Insert(_) => Insert(len),
            Delete(_) => Delete(len),
            Clip(_) => Clip(len),
        }
    }

    fn is_same_type(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Convert to the equivalent htslib cigar element
    pub fn to_cigar(&self) -> Cigar {
        use AlignmentOp::*;
        match self {
            Match(len) => Cigar::Match(*len),
            Insert(len) => Cigar::Ins(*len),
            Delete(len) => Cigar::Del(*len),
            Clip(len) => Cigar::SoftClip(*len),
        }
    }
}

/// Drop zero-length operations and merge adjacent operations of the same type
///
pub fn consolidate_ops(ops: Vec<AlignmentOp>) -> Vec<AlignmentOp> {
    let mut consolidated: Vec<AlignmentOp> = Vec::with_capacity(ops.len());
    for op in ops.into_iter().filter(|x| !x.is_empty()) {
        match consolidated.last_mut() {
            Some(last) if last.is_same_type(&op) => {
                *last = last.with_len(last.len() + op.len());
            }
            _ => consolidated.push(op),
        }
    }
    consolidated
}

/// Output of the pairwise aligner
///
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlignmentResult {
    /// Reference index aligned to the first non-clipped query position
    ///
    /// This can be negative when leading query overhang is folded into the first match run.
    pub ref_offset: i64,

    pub ops: Vec<AlignmentOp>,

    /// Score of the dynamic-programming cell where the traceback started
    pub score: i32,
}

impl AlignmentResult {
    /// Total query length described by the alignment
    pub fn query_len(&self) -> usize {
        self.ops.iter().map(|x| x.query_len() as usize).sum()
    }

    /// Number of reference positions spanned from ref_offset
    pub fn ref_span(&self) -> i64 {
        self.ops.iter().map(|x| x.ref_len() as i64).sum()
    }

    pub fn cigar(&self) -> Vec<Cigar> {
        self.ops.iter().map(|x| x.to_cigar()).collect()
    }
}

impl fmt::Display for AlignmentResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", CigarString(self.cigar()))
    }
}

impl fmt::Debug for AlignmentResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "offset: {} score: {} ref_span: {} query_len: {} cigar: {}",
            self.ref_offset,
            self.score,
            self.ref_span(),
            self.query_len(),
            self
        )
    }
}

/// Recompute the score implied by an alignment path
///
/// Match positions falling outside of the reference (which can occur for the ignore overhang
/// strategy) and clipped positions are not scored.
///
pub fn rescore_alignment(
    alignment: &AlignmentResult,
    reference: &[u8],
    query: &[u8],
    params: &SmithWatermanParameters,
) -> i32 {
    let gap_score =
        |len: u32| params.gap_open_penalty + params.gap_extend_penalty * (len as i32 - 1);

    let ref_len = reference.len() as i64;
    let mut ref_pos = alignment.ref_offset;
    let mut query_pos = 0usize;
    let mut score = 0;

    use AlignmentOp::*;
    for op in alignment.ops.iter() {
        match op {
            Match(len) => {
                for offset in 0..(*len as usize) {
                    let rpos = ref_pos + offset as i64;
                    if rpos < 0 || rpos >= ref_len {
                        continue;
                    }
                    score += if reference[rpos as usize] == query[query_pos + offset] {
                        params.match_value
                    } else {
                        params.mismatch_penalty
                    };
                }
            }
            Insert(len) | Delete(len) => {
                score += gap_score(*len);
            }
            Clip(_) => (),
        }
        ref_pos += op.ref_len() as i64;
        query_pos += op.query_len() as usize;
    }
    score
}

/// Render an alignment as wrapped reference/match/query text rows
///
/// Query bases in clipped regions are written in lowercase.
///
pub fn format_pairwise_alignment(
    alignment: &AlignmentResult,
    reference: &[u8],
    query: &[u8],
    width: usize,
) -> String {
    let ref_base = |pos: i64| {
        if pos >= 0 && (pos as usize) < reference.len() {
            reference[pos as usize]
        } else {
            b' '
        }
    };

    let mut ref_row = Vec::new();
    let mut match_row = Vec::new();
    let mut query_row = Vec::new();

    let mut ref_pos = alignment.ref_offset;
    let mut query_pos = 0usize;

    use AlignmentOp::*;
    for op in alignment.ops.iter() {
        for offset in 0..(op.len() as usize) {
            let (r, m, q) = match op {
                Match(_) => {
                    let r = ref_base(ref_pos + offset as i64);
                    let q = query[query_pos + offset];
                    (r, if r == q { b'|' } else { b' ' }, q)
                }
                Insert(_) => (b'-', b' ', query[query_pos + offset]),
                Delete(_) => (ref_base(ref_pos + offset as i64), b' ', b'-'),
                Clip(_) => (b' ', b' ', query[query_pos + offset].to_ascii_lowercase()),
            };
            ref_row.push(r);
            match_row.push(m);
            query_row.push(q);
        }
        ref_pos += op.ref_len() as i64;
        query_pos += op.query_len() as usize;
    }

    let width = width.max(1);
    let mut output = String::new();
    for ((r, m), q) in ref_row
        .chunks(width)
        .zip(match_row.chunks(width))
        .zip(query_row.chunks(width))
    {
        for row in [r, m, q] {
            output.push_str(&String::from_utf8_lossy(row));
            output.push('\n');
        }
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consolidate_ops() {
        use AlignmentOp::*;
        let ops = vec![
            Match(0),
            Delete(2),
            Delete(1),
            Match(3),
            Insert(0),
            Match(2),
            Clip(1),
        ];
        assert_eq!(
            consolidate_ops(ops),
            vec![Delete(3), Match(5), Clip(1)]
        );

        assert!(consolidate_ops(vec![Match(0)]).is_empty());
    }

    #[test]
    fn test_display() {
        use AlignmentOp::*;
        let alignment = AlignmentResult {
            ref_offset: 2,
            ops: vec![Clip(2), Match(4), Insert(1), Delete(3), Match(1)],
            score: 0,
        };
        assert_eq!(alignment.to_string(), "2S4M1I3D1M");
        assert_eq!(alignment.query_len(), 8);
        assert_eq!(alignment.ref_span(), 8);
    }

    #[test]
    fn test_rescore_alignment() {
        use AlignmentOp::*;
        let params = SmithWatermanParameters::ORIGINAL_DEFAULT;

        // Ref:   ACGTTTACG
        // Query: ACG---ACG
        let alignment = AlignmentResult {
            ref_offset: 0,
            ops: vec![Match(3), Delete(3), Match(3)],
            score: 0,
        };
        let score = rescore_alignment(&alignment, b"ACGTTTACG", b"ACGACG", &params);
        assert_eq!(score, 6 * 3 - 4 - 3 * 2);

        // Leading query overhang outside of the reference is not scored
        let alignment = AlignmentResult {
            ref_offset: -2,
            ops: vec![Match(5)],
            score: 0,
        };
        let score = rescore_alignment(&alignment, b"GCAAA", b"TTGCA", &params);
        assert_eq!(score, 9);
    }

    #[test]
    fn test_format_pairwise_alignment() {
        use AlignmentOp::*;
        let alignment = AlignmentResult {
            ref_offset: 1,
            ops: vec![Clip(1), Match(3), Delete(1), Match(2)],
            score: 0,
        };
        let text = format_pairwise_alignment(&alignment, b"AACTGTA", b"GACTTA", 80);
        assert_eq!(text, " ACTGTA\n ||| ||\ngACT-TA\n\n");
    }
}
