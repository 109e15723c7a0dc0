//! Per-file content index: a q-gram Bloom filter used to skip files during
//! content search.
//!
//! Membership answers may be wrong in one direction only: `may_contain`
//! returning `true` for an absent gram costs a redundant scan, `false` for a
//! present gram would lose matches and is therefore impossible by
//! construction (every gram of the content is inserted).

use bit_vec::BitVec;

/// Window length of an indexed gram.
pub const GRAM_LEN: usize = 3;

const BITS: usize = 4096;
const HASHES: u64 = 2;

#[derive(Debug, Clone)]
pub struct ContentIndex {
    bits: BitVec,
}

impl ContentIndex {
    /// Index every `GRAM_LEN`-byte window of `content`, lowercased so one
    /// filter serves both case-sensitive and case-insensitive queries.
    pub fn build(content: &[u8]) -> ContentIndex {
        let mut bits = BitVec::from_elem(BITS, false);
        if content.len() >= GRAM_LEN {
            let lowered: Vec<u8> = content.iter().map(|b| b.to_ascii_lowercase()).collect();
            for gram in lowered.windows(GRAM_LEN) {
                for i in 0..HASHES {
                    bits.set(slot(gram, i), true);
                }
            }
        }
        ContentIndex { bits }
    }

    /// Conservative membership test for a lowercased gram.
    pub fn may_contain(&self, gram: &[u8]) -> bool {
        (0..HASHES).all(|i| self.bits.get(slot(gram, i)).unwrap_or(true))
    }
}

fn slot(gram: &[u8], i: u64) -> usize {
    let h1 = seahash::hash(gram);
    let h2 = seahash::hash_seeded(gram, 0x16f1_1fe8, 0xb480_402c, 0x8f95_c4d6, 0x5f0c_3a7e);
    (h1.wrapping_add(i.wrapping_mul(h2)) % BITS as u64) as usize
}
