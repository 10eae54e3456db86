//! Packet Fixer (C2): undoes QPSK phase ambiguity and IQ inversion in place.
//!
//! Soft symbols are interleaved I/Q pairs (even index = I, odd index = Q) in
//! bias-128 encoding; 255 - b is the "invert" operation on a sample (negating
//! its log-likelihood). `correct` restores a distorted stream to canonical
//! (0 degrees, non-inverted) orientation; `distort` is its exact inverse and
//! exists only so the sync table in [`crate::sync`] can derive the patterns
//! that each (phase, iq) combination produces for a canonical bit sequence.

/// One of the four QPSK phase ambiguities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Deg0, Phase::Deg90, Phase::Deg180, Phase::Deg270];

    /// Decode a sync table word index (0..8) into (phase, iq_inverted).
    pub fn from_word_idx(word_idx: usize) -> (Phase, bool) {
        let phase = match word_idx % 4 {
            0 => Phase::Deg0,
            1 => Phase::Deg90,
            2 => Phase::Deg180,
            _ => Phase::Deg270,
        };
        (phase, word_idx / 4 == 1)
    }

    /// The rotation that, composed with this one, returns to 0 degrees.
    fn inverse(self) -> Phase {
        match self {
            Phase::Deg0 => Phase::Deg0,
            Phase::Deg90 => Phase::Deg270,
            Phase::Deg180 => Phase::Deg180,
            Phase::Deg270 => Phase::Deg90,
        }
    }
}

fn invert(b: u8) -> u8 {
    255 - b
}

fn rotate(i: u8, q: u8, phase: Phase) -> (u8, u8) {
    match phase {
        Phase::Deg0 => (i, q),
        Phase::Deg90 => (q, invert(i)),
        Phase::Deg180 => (invert(i), invert(q)),
        Phase::Deg270 => (invert(q), i),
    }
}

/// Apply the inverse phase rotation and IQ swap in place over `samples`,
/// which must have even length. IQ inversion is applied after rotation.
pub fn correct(samples: &mut [u8], phase: Phase, iq_inverted: bool) {
    for pair in samples.chunks_exact_mut(2) {
        let (mut i, mut q) = rotate(pair[0], pair[1], phase);
        if iq_inverted {
            std::mem::swap(&mut i, &mut q);
        }
        pair[0] = i;
        pair[1] = q;
    }
}

/// The exact inverse of [`correct`]: distorts a canonical stream the way a
/// receiver under the given (phase, iq_inverted) ambiguity would produce it.
pub(crate) fn distort(samples: &mut [u8], phase: Phase, iq_inverted: bool) {
    for pair in samples.chunks_exact_mut(2) {
        let (mut i, mut q) = (pair[0], pair[1]);
        if iq_inverted {
            std::mem::swap(&mut i, &mut q);
        }
        let (i2, q2) = rotate(i, q, phase.inverse());
        pair[0] = i2;
        pair[1] = q2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_and_distort_are_inverses() {
        let canonical: Vec<u8> = (0..64u16).map(|v| (v % 256) as u8).collect();
        for phase in Phase::ALL {
            for iq in [false, true] {
                let mut distorted = canonical.clone();
                distort(&mut distorted, phase, iq);
                correct(&mut distorted, phase, iq);
                assert_eq!(distorted, canonical, "phase={phase:?} iq={iq}");
            }
        }
    }

    #[test]
    fn deg180_is_full_byte_inversion() {
        let mut samples = vec![10u8, 200u8];
        correct(&mut samples, Phase::Deg180, false);
        assert_eq!(samples, vec![245, 55]);
    }

    #[test]
    fn word_idx_round_trips_through_phase() {
        for idx in 0..8 {
            let (phase, iq) = Phase::from_word_idx(idx);
            let back = (phase as u8 as usize) + if iq { 4 } else { 0 };
            assert_eq!(back, idx);
        }
    }

    proptest::proptest! {
        #[test]
        fn correct_and_distort_are_inverses_for_any_window(
            samples in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..32).prop_map(|mut v| { v.truncate(v.len() - v.len() % 2); v }),
            word_idx in 0usize..8,
        ) {
            let (phase, iq) = Phase::from_word_idx(word_idx);
            let mut distorted = samples.clone();
            distort(&mut distorted, phase, iq);
            correct(&mut distorted, phase, iq);
            proptest::prop_assert_eq!(distorted, samples);
        }
    }
}
