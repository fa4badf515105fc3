//! Magic modulus search.
//!
//! Finds the smallest modulus `m` for which `key % m` is injective over a static key set,
//! optionally after narrowing every key to a byte aligned bit window first. The search is a
//! generation time batch computation: every candidate modulus and window is checked on its own,
//! the first valid modulus per window is taken, and the final choice among windows is
//! deterministic (smallest modulus, then narrowest window, then lowest start bit).

use dispatch_data::{ReductionMode, Selector, WordGeometry, ceil_log2};
use log::{debug, trace};

/// Smallest modulus the search considers.
pub const MIN_MODULUS: u64 = 3;

/// Upper bound on the modulus by default: positions must fit a 16-bit index.
pub const DEFAULT_MAX_MODULUS: u64 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Also search byte aligned bit windows of the keys.
    pub allow_slicing: bool,
    /// Largest modulus tried (inclusive).
    pub max_modulus: u64,
    /// Width of the keys being reduced.
    pub key_bits: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { allow_slicing: true, max_modulus: DEFAULT_MAX_MODULUS, key_bits: Selector::BITS }
    }
}

/// Remainder bookkeeping reused across candidate moduli. A residue counts as taken when its
/// stamp equals the current generation, so moving to the next modulus is O(1).
struct ResidueSet {
    stamps: Vec<u32>,
    generation: u32,
}

impl ResidueSet {
    fn new() -> Self {
        Self { stamps: Vec::new(), generation: 0 }
    }

    fn is_injective(&mut self, values: &[u64], modulus: u64) -> bool {
        let modulus_len = modulus as usize;
        if self.stamps.len() < modulus_len {
            self.stamps.resize(modulus_len, 0);
        }
        self.generation = match self.generation.checked_add(1) {
            Some(generation) => generation,
            None => {
                self.stamps.iter_mut().for_each(|stamp| *stamp = 0);
                1
            }
        };
        let generation = self.generation;
        values.iter().all(|&value| {
            let stamp = &mut self.stamps[(value % modulus) as usize];
            let fresh = *stamp != generation;
            *stamp = generation;
            fresh
        })
    }
}

/// Scans moduli from [`MIN_MODULUS`] up to `max_modulus` and returns the first one under which
/// all remainders of `values` are distinct.
pub fn find_modulus(values: &[u64], max_modulus: u64) -> Option<u64> {
    // A modulus below the number of values cannot be injective.
    let start = MIN_MODULUS.max(values.len() as u64);
    let mut residues = ResidueSet::new();
    (start..=max_modulus).find(|&modulus| residues.is_injective(values, modulus))
}

fn all_distinct(values: &[u64]) -> bool {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted.windows(2).all(|pair| pair[0] != pair[1])
}

/// Reduces selectors into a dense position space.
pub struct SelectorReducer {
    options: SearchOptions,
    geometry: WordGeometry,
}

impl SelectorReducer {
    pub fn new(options: SearchOptions, geometry: WordGeometry) -> Self {
        Self { options, geometry }
    }

    /// Ordinal positions, no arithmetic.
    pub fn indexed(keys: &[Selector]) -> ReductionMode {
        ReductionMode::indexed(keys.len())
    }

    /// Searches for an injective magic modulus, `None` when nothing up to `max_modulus` works.
    pub fn reduce(&self, keys: &[Selector]) -> Option<ReductionMode> {
        let key_bits = self.options.key_bits.min(Selector::BITS);
        let raw: Vec<u64> = keys.iter().map(|key| key.window(0, key_bits)).collect();
        if !all_distinct(&raw) {
            debug!(
                "selectors are not distinct within {key_bits} bits, no modulus can separate them"
            );
            return None;
        }

        let baseline = find_modulus(&raw, self.options.max_modulus)
            .map(|modulus| ReductionMode::Magic { start_bit: 0, bit_width: key_bits, modulus });
        debug!("baseline modulus for {} keys: {:?}", keys.len(), baseline.map(|b| b.span()));

        if !self.options.allow_slicing {
            return baseline;
        }

        // A sliced candidate only pays for its extra extraction step when it saves words.
        let bound = match baseline {
            Some(mode) => {
                let words = self.geometry.words_for(mode.span());
                (words - 1) * u64::from(self.geometry.elements_per_word())
            }
            None => self.options.max_modulus,
        };
        let sliced = self.search_windows(keys, key_bits, bound.min(self.options.max_modulus));

        match (baseline, sliced) {
            (Some(base), Some(sliced))
                if self.geometry.words_for(sliced.span()) < self.geometry.words_for(base.span()) =>
            {
                debug!("adopting sliced reduction: {sliced}");
                Some(sliced)
            }
            (None, Some(sliced)) => {
                debug!("only a sliced reduction exists: {sliced}");
                Some(sliced)
            }
            (base, _) => base,
        }
    }

    /// Best window candidate with a modulus of at most `bound`. The bound shrinks as candidates
    /// are found, so each window stops at the first modulus that could still win.
    fn search_windows(
        &self,
        keys: &[Selector],
        key_bits: u32,
        bound: u64,
    ) -> Option<ReductionMode> {
        let min_width = ceil_log2(keys.len() as u64).max(1);
        let mut best: Option<ReductionMode> = None;
        let mut windowed = Vec::with_capacity(keys.len());

        for bit_width in min_width..=key_bits {
            for start_bit in (0..=key_bits - bit_width).step_by(8) {
                let limit = best.map_or(bound, |b| b.span() - 1);
                if limit < MIN_MODULUS {
                    return best;
                }

                windowed.clear();
                windowed.extend(keys.iter().map(|key| key.window(start_bit, bit_width)));
                if !all_distinct(&windowed) {
                    trace!("window [{start_bit}, {}) collides", start_bit + bit_width);
                    continue;
                }

                if let Some(modulus) = find_modulus(&windowed, limit) {
                    let end_bit = start_bit + bit_width;
                    trace!("window [{start_bit}, {end_bit}) admits modulus {modulus}");
                    best = Some(ReductionMode::Magic { start_bit, bit_width, modulus });
                }
            }
        }
        best
    }
}
