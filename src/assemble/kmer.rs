//! K-mer position table and candidate-overlap bitmap.
//!
//! The position table is a flat `Vec<u16>`, sized `num_kmers * 4^k`,
//! the same "one big contiguous array indexed by encoded k-mer" shape
//! as the reference crate's narrow-width k-mer code tables in
//! `kmer_codec.rs`, just holding a read position instead of a count.
//! Both structures track which slots they actually wrote so a pair
//! boundary can clear them in `O(touched)` instead of `O(4^k)`.

use smallvec::SmallVec;

use crate::assemble::nt::{is_degenerate, Nt};
use crate::assemble::types::QualBase;

/// Touched-slot stack: almost every read only ever dirties a handful of
/// table/bitmap entries before the next pair clears them, the same
/// small-and-usually-stack-allocated shape as the reference crate's
/// per-window encoding buffers.
type Touched = SmallVec<[u32; 16]>;

/// Maps each non-degenerate base to its 2-bit code; anything else is
/// not indexable and must reset the running k-mer.
#[inline(always)]
fn base_code(nt: Nt) -> Option<u32> {
    match nt {
        crate::assemble::nt::NT_A => Some(0),
        crate::assemble::nt::NT_C => Some(1),
        crate::assemble::nt::NT_G => Some(2),
        crate::assemble::nt::NT_T => Some(3),
        _ => None,
    }
}

/// Fixed-k position table recording up to `num_kmers` occurrences of
/// each k-mer seen in a read.
pub struct KmerTable {
    k: usize,
    num_kmers: usize,
    slots: Vec<u16>,
    touched: Touched,
    lost: u64,
}

impl KmerTable {
    pub fn new(k: usize, num_kmers: usize) -> Self {
        let len = num_kmers
            .checked_mul(4usize.pow(k as u32))
            .expect("kmer table size overflow");
        KmerTable {
            k,
            num_kmers,
            slots: vec![0; len],
            touched: SmallVec::new(),
            lost: 0,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of k-mers dropped because all `num_kmers` slots were
    /// already occupied, since the table last cleared.
    pub fn lost_count(&self) -> u64 {
        self.lost
    }

    /// Populate the table by sliding a k-length window across
    /// `read`, storing `position + 1` (1-based) in the first free slot
    /// for each fully non-degenerate k-mer. Any base that is not a
    /// plain A/C/G/T restarts the window.
    pub fn index_forward(&mut self, read: &[QualBase]) {
        let k = self.k;
        if read.len() < k {
            return;
        }
        let mut code: u32 = 0;
        let mut run = 0usize;
        for (pos, base) in read.iter().enumerate() {
            match base_code(base.nt) {
                Some(c) => {
                    code = ((code << 2) | c) & (4u32.pow(k as u32) - 1);
                    run += 1;
                }
                None => {
                    run = 0;
                    code = 0;
                    continue;
                }
            }
            if run < k {
                continue;
            }
            let start = pos + 1 - k;
            self.store(code as usize, (start + 1) as u16);
        }
    }

    fn store(&mut self, kmer: usize, value: u16) {
        let base = kmer * self.num_kmers;
        for slot in 0..self.num_kmers {
            if self.slots[base + slot] == 0 {
                self.slots[base + slot] = value;
                self.touched.push((base + slot) as u32);
                return;
            }
        }
        self.lost += 1;
    }

    /// Positions (1-based) stored for k-mer code `kmer`, skipping
    /// empty slots.
    fn positions(&self, kmer: usize) -> impl Iterator<Item = u16> + '_ {
        let base = kmer * self.num_kmers;
        self.slots[base..base + self.num_kmers]
            .iter()
            .copied()
            .filter(|&v| v != 0)
    }

    /// Scan `read`'s k-mers from the 3' end backward, and for every
    /// k-mer shared with a position recorded by `index_forward`,
    /// derive a candidate overlap length and set the corresponding bit
    /// in `bitmap`. `forward_len`/`reverse_len` and `min_overlap` feed
    /// the offset formula `ovl = forward_len + reverse_len - pr - pf -
    /// min_overlap - 1`.
    pub fn mark_candidates(
        &self,
        read: &[QualBase],
        forward_len: usize,
        reverse_len: usize,
        min_overlap: usize,
        bitmap: &mut CandidateBitmap,
    ) {
        let k = self.k;
        if read.len() < k {
            return;
        }
        let mut code: u32 = 0;
        let mut run = 0usize;
        // Walk from the end so the window represents the k-mer ending
        // at the current (descending) position, matching the forward
        // scan's left-to-right window but traversed tail-first.
        for pos in (0..read.len()).rev() {
            match base_code(read[pos].nt) {
                Some(c) => {
                    code = (code >> 2) | (c << (2 * (k - 1)));
                    run += 1;
                }
                None => {
                    run = 0;
                    code = 0;
                    continue;
                }
            }
            if run < k {
                continue;
            }
            let pr = pos; // 0-based start of the k-mer in the reverse read
            for pf1 in self.positions(code as usize) {
                let pf = pf1 as usize - 1;
                let total = forward_len as isize + reverse_len as isize;
                let ovl = total - pr as isize - pf as isize - min_overlap as isize - 1;
                if ovl >= 0 {
                    bitmap.set(ovl as usize);
                }
            }
        }
    }

    /// Re-zero every slot written since the last clear.
    pub fn clear(&mut self) {
        for &slot in &self.touched {
            self.slots[slot as usize] = 0;
        }
        self.touched.clear();
        self.lost = 0;
    }
}

/// Bitset of candidate overlap lengths, sized to `MAX_LEN`, cleared in
/// `O(touched words)` the same way as `KmerTable`.
pub struct CandidateBitmap {
    words: Vec<u64>,
    touched: Touched,
}

impl CandidateBitmap {
    pub fn new(max_len: usize) -> Self {
        let nwords = max_len / 64 + 1;
        CandidateBitmap {
            words: vec![0; nwords],
            touched: SmallVec::new(),
        }
    }

    pub fn set(&mut self, bit: usize) {
        let word = bit / 64;
        if word >= self.words.len() {
            return;
        }
        if self.words[word] == 0 {
            self.touched.push(word as u32);
        }
        self.words[word] |= 1 << (bit % 64);
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Set every bit up to (and including) `max_bit`, used for the
    /// exhaustive fallback when no k-mer candidate was found.
    pub fn set_all(&mut self, max_bit: usize) {
        for bit in 0..=max_bit {
            self.set(bit);
        }
    }

    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &w)| {
            (0..64).filter(move |&b| (w >> b) & 1 != 0).map(move |b| wi * 64 + b)
        })
    }

    pub fn clear(&mut self) {
        for &word in &self.touched {
            self.words[word as usize] = 0;
        }
        self.touched.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::nt::{NT_A, NT_C, NT_G, NT_T};

    fn q(nt: Nt, phred: u8) -> QualBase {
        QualBase::new(nt, phred)
    }

    fn seq(bases: &[Nt]) -> Vec<QualBase> {
        bases.iter().map(|&b| q(b, 40)).collect()
    }

    #[test]
    fn table_starts_empty_and_clears_fully() {
        let mut table = KmerTable::new(4, 2);
        let read = seq(&[NT_A, NT_C, NT_G, NT_T, NT_A, NT_C, NT_G, NT_T]);
        table.index_forward(&read);
        assert!(!table.touched.is_empty());
        table.clear();
        assert!(table.slots.iter().all(|&s| s == 0));
        assert!(table.touched.is_empty());
    }

    #[test]
    fn degenerate_base_resets_the_running_window() {
        let mut table = KmerTable::new(4, 2);
        let read = seq(&[NT_A, NT_C, crate::assemble::nt::NT_N, NT_A, NT_C, NT_G, NT_T]);
        table.index_forward(&read);
        // only one full 4-mer (ACGT at position 3) should have been indexed
        assert_eq!(table.touched.len(), 1);
    }

    #[test]
    fn overlapping_reads_mark_a_candidate_bit() {
        let mut table = KmerTable::new(4, 2);
        let forward = seq(&[NT_A, NT_A, NT_A, NT_A, NT_C, NT_G, NT_T, NT_A]);
        table.index_forward(&forward);

        let mut bitmap = CandidateBitmap::new(64);
        let reverse = seq(&[NT_A, NT_C, NT_G, NT_T, NT_T, NT_T, NT_T, NT_T]);
        table.mark_candidates(&reverse, forward.len(), reverse.len(), 2, &mut bitmap);
        assert!(!bitmap.is_empty());
    }

    #[test]
    fn bitmap_set_all_covers_every_bit_up_to_max() {
        let mut bitmap = CandidateBitmap::new(16);
        bitmap.set_all(10);
        let bits: Vec<usize> = bitmap.iter_set().collect();
        assert_eq!(bits.len(), 11);
    }
}
