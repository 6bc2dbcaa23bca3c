//! Property-based tests for sedline
//!
//! This module uses proptest to verify core invariants of the engine.
//! Property-based testing generates hundreds of random inputs to verify
//! that certain properties always hold true.

use std::fs;
use std::io::{self, Cursor};
use tempfile::TempDir;

use sedline::session::{EditState, InputLines};
use sedline::{AddressKind, Command, CommandKind, FileProcessor, Options, Outcome, Script, Session, Substitution};

use proptest::prelude::*;

/// Run `script` over `input` by editing a temp file in place and return
/// the outcome and the rewritten file.
fn edit_file(script: &str, input: &str) -> (Outcome, String) {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("input.txt");
    fs::write(&file_path, input).unwrap();

    let script = Script::parse(script.as_bytes()).unwrap();
    let session = Session::new(script, Options::default(), Box::new(io::sink()));
    let mut processor = FileProcessor::new(session, true);
    let outcome = processor.run(&[file_path.clone()]).unwrap();

    (outcome, fs::read_to_string(&file_path).unwrap())
}

fn numbered(count: usize) -> String {
    (1..=count).map(|n| format!("line {}\n", n)).collect()
}

fn state(pattern: &[u8], hold: &[u8]) -> EditState {
    let mut state = EditState::new(Box::new(io::sink()), Options::default());
    state.line_number = 1;
    state.pattern_space = pattern.to_vec();
    state.hold_space = hold.to_vec();
    state
}

fn apply(kind: CommandKind, state: &mut EditState) {
    let mut input = InputLines::new(Cursor::new(Vec::new()), true).unwrap();
    Command::new(None, kind).apply(state, &mut input).unwrap();
}

// ============================================================================
// Property 1: Substitution
// ============================================================================

proptest! {
    /// Asking for a match beyond the last one leaves the text alone
    #[test]
    fn prop_nth_beyond_match_count_is_unchanged(
        text in "[a-e]{0,40}",
        target in "[a-e]",
        extra in 1usize..5
    ) {
        let count = text.matches(target.as_str()).count();
        let flag = (count + extra).to_string();
        let sub = Substitution::new(target.as_bytes(), b"#", flag.as_bytes()).unwrap();
        prop_assert_eq!(sub.apply(text.as_bytes()), text.as_bytes().to_vec());
    }

    /// Global replace is idempotent once the pattern no longer matches
    #[test]
    fn prop_global_substitution_is_idempotent(
        text in "[a-z]{0,100}",
        pattern in "[x-z]{1,3}"
    ) {
        let sub = Substitution::new(pattern.as_bytes(), b"_", b"g").unwrap();
        let once = sub.apply(text.as_bytes());
        let twice = sub.apply(&once);
        prop_assert_eq!(once, twice);
    }

    /// The first match is replaced exactly where a plain search finds it
    #[test]
    fn prop_first_occurrence_matches_str_replacen(
        text in "[a-c]{0,40}",
        target in "[a-c]"
    ) {
        let sub = Substitution::new(target.as_bytes(), b"X", b"").unwrap();
        let expected = text.replacen(target.as_str(), "X", 1);
        prop_assert_eq!(sub.apply(text.as_bytes()), expected.into_bytes());
    }
}

// ============================================================================
// Property 2: Addresses
// ============================================================================

proptest! {
    /// A backwards range selects only its start line
    #[test]
    fn prop_backwards_range_is_single_line(start in 2usize..1000, back in 1usize..1000) {
        let end = start.saturating_sub(back).max(1);
        prop_assume!(end < start);
        let script = Script::parse(format!("{},{}p", start, end).as_bytes()).unwrap();
        let address = script.main[0].address.as_ref().unwrap();
        prop_assert!(matches!(address.kind, AddressKind::Line(n) if n == start));
    }

    /// Deleting a range removes exactly those lines and keeps the rest in order
    #[test]
    fn prop_range_delete_removes_exactly_the_range(
        total in 1usize..30,
        a in 1usize..30,
        b in 1usize..30
    ) {
        let (start, end) = (a.min(b), a.max(b));
        let (_, output) = edit_file(&format!("{},{}d", start, end), &numbered(total));
        let expected: String = (1..=total)
            .filter(|n| *n < start || *n > end)
            .map(|n| format!("line {}\n", n))
            .collect();
        prop_assert_eq!(output, expected);
    }
}

// ============================================================================
// Property 3: Hold space
// ============================================================================

proptest! {
    /// x twice restores both buffers
    #[test]
    fn prop_exchange_twice_is_identity(
        pattern in prop::collection::vec(any::<u8>(), 0..64),
        hold in prop::collection::vec(any::<u8>(), 0..64)
    ) {
        let mut s = state(&pattern, &hold);
        apply(CommandKind::Exchange, &mut s);
        apply(CommandKind::Exchange, &mut s);
        prop_assert_eq!(s.pattern_space, pattern);
        prop_assert_eq!(s.hold_space, hold);
    }

    /// h then g restores the pattern space
    #[test]
    fn prop_hold_then_get_restores_pattern(
        pattern in prop::collection::vec(any::<u8>(), 0..64),
        clobber in prop::collection::vec(any::<u8>(), 0..64)
    ) {
        let mut s = state(&pattern, b"");
        apply(CommandKind::Hold { append: false }, &mut s);
        s.pattern_space = clobber;
        apply(CommandKind::Get { append: false }, &mut s);
        prop_assert_eq!(s.pattern_space, pattern);
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_global_substitution_scenario() {
    assert_eq!(edit_file("s/o/0/g", "good\n").1, "g00d\n");
}

#[test]
fn test_first_occurrence_scenario() {
    assert_eq!(edit_file("s/o/0/1", "good\n").1, "g0od\n");
}

#[test]
fn test_range_delete_scenario() {
    let (_, output) = edit_file("3,5d", &numbered(10));
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines,
        vec!["line 1", "line 2", "line 6", "line 7", "line 8", "line 9", "line 10"]
    );
}

#[test]
fn test_quit_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("input.txt");
    fs::write(&file_path, numbered(10)).unwrap();

    let script = Script::parse(b"2q/7").unwrap();
    let session = Session::new(script, Options::default(), Box::new(io::sink()));
    let mut processor = FileProcessor::new(session, true);
    let outcome = processor.run(&[file_path.clone()]).unwrap();

    assert_eq!(outcome, Outcome::Quit(7));
    assert_eq!(processor.session().line_number(), 2);
    // finalization is skipped, so the partial output stays in the temp file
    assert_eq!(fs::read_to_string(&file_path).unwrap(), numbered(10));
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("input.txt.tmp")).unwrap(),
        "line 1\n"
    );
}

#[test]
fn test_hash_n_scenario() {
    let (_, output) = edit_file("#n\ns/line/LINE/", &numbered(3));
    assert_eq!(output, "");
    let (_, output) = edit_file("#n\n2p", &numbered(3));
    assert_eq!(output, "line 2\n");
}
