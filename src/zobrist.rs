// src/zobrist.rs

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use std::sync::OnceLock;

use crate::board::Position;
use crate::defs::{Color, Piece, Square};

/// Fixed seed: the keys are constants of the build, so hashes are stable
/// across runs and processes.
const ZOBRIST_SEED: u64 = 0x6AF5_E9C2_41D3_8B07;

static KEYS: OnceLock<ZobristKeys> = OnceLock::new();

/// Process-wide Zobrist constants, generated once and read-only afterwards.
#[inline]
pub fn keys() -> &'static ZobristKeys {
    KEYS.get_or_init(|| ZobristKeys::new_with_seed(ZOBRIST_SEED))
}

/// Random 64-bit keys for every hashed board feature.
///
/// `piece_square` is indexed WP WN WB WR WQ WK BP BN BB BR BQ BK, then by
/// square. `castle` is indexed like the [`CastlingRights`] flag bits
/// (WK WQ BK BQ). `white_to_move` is XORed in iff White is to move.
///
/// The en-passant contribution is not a key at all: mutators XOR the raw
/// ep square index into the hash, a quirk kept for hash compatibility.
///
/// [`CastlingRights`]: crate::board::CastlingRights
pub struct ZobristKeys {
    pub piece_square: [[u64; 64]; 12],
    pub castle: [u64; 4],
    pub white_to_move: u64,
}

impl ZobristKeys {
    pub fn new_with_seed(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);

        let mut piece_square = [[0u64; 64]; 12];
        for per_piece in piece_square.iter_mut() {
            for key in per_piece.iter_mut() {
                *key = rng.next_u64();
            }
        }

        let castle = [rng.next_u64(), rng.next_u64(), rng.next_u64(), rng.next_u64()];
        let white_to_move = rng.next_u64();

        Self { piece_square, castle, white_to_move }
    }

    #[inline]
    pub fn piece_key(&self, c: Color, p: Piece, sq: Square) -> u64 {
        self.piece_square[piece_index(c, p)][sq.0 as usize]
    }
}

/// Row of `piece_square` for a colored piece. Valid for the six real kinds
/// only.
#[inline]
pub(crate) fn piece_index(c: Color, p: Piece) -> usize {
    debug_assert!(p as u8 >= Piece::Pawn as u8 && p as u8 <= Piece::King as u8);
    (p as usize - 1) + (c as usize) * 6
}

/// From-scratch hash of `pos`. The incrementally maintained hash must equal
/// this after every mutation; the halfmove clock and fullmove number do not
/// participate.
pub fn recompute_hash(pos: &Position) -> u64 {
    let k = keys();
    let mut hash = 0u64;

    if pos.stm == Color::White {
        hash ^= k.white_to_move;
    }
    for i in 0..4 {
        if pos.castling_rights().0 & (1 << i) != 0 {
            hash ^= k.castle[i];
        }
    }
    hash ^= pos.en_passant() as u64;

    for i in 0..64u8 {
        let sq = Square(i);
        match pos.piece_at(sq) {
            Piece::Nothing | Piece::All => {}
            p => {
                let c = if pos.side(Color::White).contains(sq) {
                    Color::White
                } else {
                    Color::Black
                };
                hash ^= k.piece_key(c, p, sq);
            }
        }
    }
    hash
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic() {
        let a = ZobristKeys::new_with_seed(ZOBRIST_SEED);
        let b = ZobristKeys::new_with_seed(ZOBRIST_SEED);
        assert_eq!(a.piece_square, b.piece_square);
        assert_eq!(a.castle, b.castle);
        assert_eq!(a.white_to_move, b.white_to_move);
    }

    #[test]
    fn piece_index_layout() {
        assert_eq!(piece_index(Color::White, Piece::Pawn), 0);
        assert_eq!(piece_index(Color::White, Piece::King), 5);
        assert_eq!(piece_index(Color::Black, Piece::Pawn), 6);
        assert_eq!(piece_index(Color::Black, Piece::King), 11);
    }

    #[test]
    fn startpos_hash_matches_incremental_seed() {
        let pos = Position::new();
        assert_eq!(pos.hash(), recompute_hash(&pos));
    }
}
