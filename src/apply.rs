// src/apply.rs

use crate::board::{BitBoard, CastlingRights, Position};
use crate::defs::{Color, Piece, Square};
use crate::moves::Move;
use crate::zobrist::keys;

/// Add this to the ep square to find the captured pawn for each color.
const EP_VICTIM_DELTA: [i16; 2] = [-8, 8];

/// The minimal pre-image of one move: everything [`Position::restore`]
/// needs to take it back in O(1). Plain `Copy` data, so callers can keep a
/// stack of these, one per ply.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoardSave {
    ep: u8,
    halfmove: u8,
    castle: CastlingRights,
    hash: u64,
    from: Square,
    to: Square,
    /// Kind that moved (pre-promotion).
    from_piece: Piece,
    /// Kind that landed on `to`; differs from `from_piece` only for
    /// promotions.
    to_piece: Piece,
    /// `Nothing` when the move captured nothing.
    capture_piece: Piece,
    /// Equals `to` for ordinary captures; the square behind the ep target
    /// for en passant.
    capture_loc: Square,
    /// Both zero unless the move castled.
    rook_from: Square,
    rook_to: Square,
    /// Previous values of the touched bitboard slots.
    moved_bb: BitBoard,
    promoted_bb: BitBoard,
    captured_bb: BitBoard,
    rook_bb: BitBoard,
    all: [BitBoard; 2],
}

/// Take-back record for a null move.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSave {
    ep: u8,
}

impl Position {
    /// Applies `m` to the board and fills `save` for [`Position::restore`].
    ///
    /// `m` must be in the legal move set of the current position; applying
    /// anything else is undefined (caller contract). Simple moves (hint bit
    /// set) skip the promotion, en-passant and castling work entirely.
    pub fn make_move(&mut self, m: Move, save: &mut BoardSave) {
        let us = self.stm;
        let them = !us;
        let from = m.from_sq();
        let to = m.to_sq();
        let piece = self.piece_at(from);
        let landed = match m.promotion_kind() {
            Piece::Nothing => piece,
            promo => promo,
        };

        save.ep = self.ep;
        save.halfmove = self.halfmove;
        save.castle = self.castle;
        save.hash = self.hash;
        save.from = from;
        save.to = to;
        save.from_piece = piece;
        save.to_piece = landed;
        save.capture_piece = Piece::Nothing;
        save.capture_loc = to;
        save.rook_from = Square(0);
        save.rook_to = Square(0);
        save.moved_bb = self.bbs[us as usize][piece];
        save.promoted_bb = self.bbs[us as usize][landed];
        save.captured_bb = BitBoard(0);
        save.rook_bb = self.bbs[us as usize][Piece::Rook];
        save.all = [self.bbs[0].all(), self.bbs[1].all()];

        if us == Color::Black {
            // the fullmove number advances after Black's move
            self.fullmove += 1;
        }

        let old_ep = self.ep;
        self.hash ^= old_ep as u64;
        self.ep = 0;

        if m.is_simple() {
            self.make_simple(piece, from, to, save);
        } else {
            self.make_general(piece, landed, from, to, old_ep, save);
        }

        self.hash ^= self.ep as u64;
        self.hash ^= keys().white_to_move;
        self.stm = them;
    }

    /// Fast path: no promotion, en passant, or castle to consider.
    fn make_simple(&mut self, piece: Piece, from: Square, to: Square, save: &mut BoardSave) {
        let us = self.stm;
        let them = !us;
        let k = keys();

        let victim = self.piece_at(to);
        if victim != Piece::Nothing {
            save.capture_piece = victim;
            save.capture_loc = to;
            save.captured_bb = self.bbs[them as usize][victim];
            self.remove_piece(them, victim, to);
            self.hash ^= k.piece_key(them, victim, to);
            if victim == Piece::Rook {
                self.strip_rights_on_rook_capture(them, to);
            }
            self.halfmove = 0;
        } else if piece == Piece::Pawn {
            self.halfmove = 0;
        } else {
            self.halfmove = self.halfmove.saturating_add(1);
        }

        self.strip_rights_on_piece_move(us, piece, from);

        if piece == Piece::Pawn && (to.0 as i16 - from.0 as i16).abs() == 16 {
            self.ep = (from.0 + to.0) / 2;
        }

        self.move_piece(us, piece, piece, from, to);
        self.hash ^= k.piece_key(us, piece, from);
        self.hash ^= k.piece_key(us, piece, to);
    }

    /// General path, following the full step order.
    fn make_general(
        &mut self,
        piece: Piece,
        landed: Piece,
        from: Square,
        to: Square,
        old_ep: u8,
        save: &mut BoardSave,
    ) {
        let us = self.stm;
        let them = !us;
        let k = keys();
        let mut is_capture = false;

        // castling: the king moves two squares and drags its rook over
        if piece == Piece::King && (to.0 as i16 - from.0 as i16).abs() == 2 {
            let (rook_from, rook_to) = if to.0 > from.0 {
                (Square(to.0 + 1), Square(to.0 - 1))
            } else {
                (Square(to.0 - 2), Square(to.0 + 1))
            };
            save.rook_from = rook_from;
            save.rook_to = rook_to;
            self.move_piece(us, Piece::Rook, Piece::Rook, rook_from, rook_to);
            self.hash ^= k.piece_key(us, Piece::Rook, rook_from);
            self.hash ^= k.piece_key(us, Piece::Rook, rook_to);
        }

        // en-passant capture: the victim sits one rank behind the target
        if piece == Piece::Pawn && old_ep != 0 && to.0 == old_ep {
            let victim_sq = Square((old_ep as i16 + EP_VICTIM_DELTA[us as usize]) as u8);
            save.capture_piece = Piece::Pawn;
            save.capture_loc = victim_sq;
            save.captured_bb = self.bbs[them as usize][Piece::Pawn];
            self.remove_piece(them, Piece::Pawn, victim_sq);
            self.hash ^= k.piece_key(them, Piece::Pawn, victim_sq);
            is_capture = true;
        }

        // ordinary capture
        let victim = self.piece_at(to);
        if victim != Piece::Nothing {
            save.capture_piece = victim;
            save.capture_loc = to;
            save.captured_bb = self.bbs[them as usize][victim];
            self.remove_piece(them, victim, to);
            self.hash ^= k.piece_key(them, victim, to);
            if victim == Piece::Rook {
                self.strip_rights_on_rook_capture(them, to);
            }
            is_capture = true;
        }

        if is_capture || piece == Piece::Pawn {
            self.halfmove = 0;
        } else {
            self.halfmove = self.halfmove.saturating_add(1);
        }

        self.strip_rights_on_piece_move(us, piece, from);

        if piece == Piece::Pawn && (to.0 as i16 - from.0 as i16).abs() == 16 {
            self.ep = (from.0 + to.0) / 2;
        }

        // promotions leave the pawn bitboard and enter on the landed kind's
        self.move_piece(us, piece, landed, from, to);
        self.hash ^= k.piece_key(us, piece, from);
        self.hash ^= k.piece_key(us, landed, to);
    }

    /// Exactly undoes the immediately preceding [`Position::make_move`] on
    /// this position. The result is bit-for-bit identical to the pre-move
    /// state, hash included.
    pub fn restore(&mut self, save: &BoardSave) {
        self.stm = !self.stm;
        let us = self.stm;
        let them = !us;
        if us == Color::Black {
            self.fullmove -= 1;
        }
        self.ep = save.ep;
        self.halfmove = save.halfmove;
        self.castle = save.castle;
        self.hash = save.hash;

        // assign the saved slots back; for plain moves both writes hit the
        // same slot with the same value
        self.bbs[us as usize][save.to_piece] = save.promoted_bb;
        self.bbs[us as usize][save.from_piece] = save.moved_bb;
        if save.rook_from != save.rook_to {
            self.bbs[us as usize][Piece::Rook] = save.rook_bb;
        }
        if save.capture_piece != Piece::Nothing {
            self.bbs[them as usize][save.capture_piece] = save.captured_bb;
        }
        self.bbs[0][Piece::All] = save.all[0];
        self.bbs[1][Piece::All] = save.all[1];

        // rewrite the touched mailbox squares; the capture location equals
        // `to` for ordinary captures, so it is cleared before the rewrite
        self.pieces[save.to.0 as usize] = Piece::Nothing;
        self.pieces[save.from.0 as usize] = save.from_piece;
        if save.capture_piece != Piece::Nothing {
            self.pieces[save.capture_loc.0 as usize] = save.capture_piece;
        }
        if save.rook_from != save.rook_to {
            self.pieces[save.rook_to.0 as usize] = Piece::Nothing;
            self.pieces[save.rook_from.0 as usize] = Piece::Rook;
        }
    }

    /// The side to move passes. Clears the ep square and flips the side;
    /// the halfmove clock is deliberately untouched. May leave the mover in
    /// check; null moves are a search heuristic, not a legal move.
    pub fn make_null(&mut self, save: &mut NullSave) {
        save.ep = self.ep;
        self.hash ^= self.ep as u64;
        self.ep = 0;
        self.hash ^= keys().white_to_move;
        self.stm = !self.stm;
    }

    /// Exactly undoes the immediately preceding [`Position::make_null`].
    pub fn restore_null(&mut self, save: &NullSave) {
        self.stm = !self.stm;
        self.hash ^= keys().white_to_move;
        self.ep = save.ep;
        self.hash ^= save.ep as u64;
    }

    fn clear_right(&mut self, flag: CastlingRights) {
        if self.castle.contains(flag) {
            self.castle.remove(flag);
            self.hash ^= keys().castle[flag.key_index()];
        }
    }

    /// King moves lose both rights; rook moves off a home square lose that
    /// side's right. Rights only ever get cleared, never set.
    fn strip_rights_on_piece_move(&mut self, us: Color, piece: Piece, from: Square) {
        match piece {
            Piece::King => {
                self.clear_right(CastlingRights::kingside(us));
                self.clear_right(CastlingRights::queenside(us));
            }
            Piece::Rook => {
                let home_rank_base = if us == Color::White { 0 } else { 56 };
                if from.0 == home_rank_base + 7 {
                    self.clear_right(CastlingRights::kingside(us));
                } else if from.0 == home_rank_base {
                    self.clear_right(CastlingRights::queenside(us));
                }
            }
            _ => {}
        }
    }

    /// Capturing a rook on its home square strips the owner's right.
    fn strip_rights_on_rook_capture(&mut self, owner: Color, sq: Square) {
        let home_rank_base = if owner == Color::White { 0 } else { 56 };
        if sq.0 == home_rank_base + 7 {
            self.clear_right(CastlingRights::kingside(owner));
        } else if sq.0 == home_rank_base {
            self.clear_right(CastlingRights::queenside(owner));
        }
    }
}

/// Whether `m` captures something on the current board, counting en
/// passant.
pub fn is_capture(m: Move, pos: &Position) -> bool {
    let to = m.to_sq();
    if pos.occupied().contains(to) {
        return true;
    }
    let from_bb = BitBoard::from_square(m.from_sq());
    let pawns = pos.pieces(Color::White, Piece::Pawn) | pos.pieces(Color::Black, Piece::Pawn);
    !(from_bb & pawns).is_empty() && pos.en_passant() != 0 && to.0 == pos.en_passant()
}
