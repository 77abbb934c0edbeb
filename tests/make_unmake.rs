// tests/make_unmake.rs

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use gryphon::zobrist::recompute_hash;
use gryphon::{generate_legal_moves, king_in_check, position_from_fen, BoardSave, Position};

const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

/// Plays random legal moves, asserting the position invariants after every
/// make and every restore.
fn random_playout(fen: &str, games: u32, max_plies: u32, seed: u64) {
    let mut rng = SmallRng::seed_from_u64(seed);

    for game in 0..games {
        let mut pos = position_from_fen(fen).unwrap();
        for ply in 0..max_plies {
            let moves = generate_legal_moves(&pos);
            if moves.is_empty() {
                break; // checkmate or stalemate is a legal terminal state
            }
            let m = moves[rng.gen_range(0..moves.len())];
            let before = pos.clone();

            let mut save = BoardSave::default();
            pos.make_move(m, &mut save);

            let ctx = format!("game {game} ply {ply} move {m}");
            assert_eq!(pos.check_consistency(), None, "inconsistent after {ctx}");
            assert_eq!(pos.hash(), recompute_hash(&pos), "hash drift after {ctx}");
            // the mover may never leave their own king hanging
            assert!(
                !king_in_check(&pos, !pos.stm),
                "king left in check after {ctx}"
            );

            pos.restore(&save);
            assert_eq!(pos, before, "restore mismatch after {ctx}");

            // now actually advance
            pos.make_move(m, &mut save);
        }
    }
}

#[test]
fn random_playout_from_startpos() {
    random_playout(STARTPOS, 48, 60, 0xC0FFEE);
}

#[test]
fn random_playout_from_kiwipete() {
    random_playout(KIWIPETE, 48, 60, 0xBEEF);
}

#[test]
fn zobrist_round_trips_over_random_sequences() {
    let mut rng = SmallRng::seed_from_u64(0x5EED);
    let initial = Position::new();

    for _ in 0..2_000 {
        let mut pos = initial.clone();
        let mut saves: Vec<BoardSave> = Vec::with_capacity(10);

        for _ in 0..10 {
            let moves = generate_legal_moves(&pos);
            if moves.is_empty() {
                break;
            }
            let m = moves[rng.gen_range(0..moves.len())];
            let mut save = BoardSave::default();
            pos.make_move(m, &mut save);
            saves.push(save);
        }

        for save in saves.iter().rev() {
            pos.restore(save);
        }
        assert_eq!(pos.hash(), initial.hash());
        assert_eq!(pos, initial);
    }
}

#[test]
fn null_move_round_trips_anywhere() {
    let mut rng = SmallRng::seed_from_u64(0xA11);
    let mut pos = position_from_fen(KIWIPETE).unwrap();
    let mut save = BoardSave::default();

    for _ in 0..40 {
        let before = pos.clone();
        let mut null_save = gryphon::NullSave::default();
        pos.make_null(&mut null_save);
        assert_eq!(pos.hash(), recompute_hash(&pos));
        pos.restore_null(&null_save);
        assert_eq!(pos, before);

        let moves = generate_legal_moves(&pos);
        if moves.is_empty() {
            break;
        }
        let m = moves[rng.gen_range(0..moves.len())];
        pos.make_move(m, &mut save);
    }
}
