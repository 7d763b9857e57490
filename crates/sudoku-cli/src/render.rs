use std::fmt::Write;
use sudoku_core::Position;
use sudoku_session::SessionSnapshot;

/// Format seconds as MM:SS or HH:MM:SS
pub fn format_time(secs: u64) -> String {
    if secs >= 3600 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        let secs = secs % 60;
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{:02}:{:02}", mins, secs)
    }
}

/// The player grid with box separators, followed by a status line.
/// The selected cell is bracketed.
pub fn board(snap: &SessionSnapshot) -> String {
    let mut out = String::new();
    for row in 0..9 {
        if row > 0 && row % 3 == 0 {
            out.push_str("------+-------+------\n");
        }
        let mut line = String::new();
        for col in 0..9 {
            if col > 0 && col % 3 == 0 {
                line.push_str("| ");
            }
            let pos = Position::new(row, col);
            let ch = match snap.player.get(pos).value() {
                Some(v) => char::from(b'0' + v),
                None => '.',
            };
            if snap.selected == Some(pos) {
                let _ = write!(line, "[{ch}]");
            } else {
                line.push(ch);
                line.push(' ');
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    let _ = write!(
        out,
        "\n{}  {}  {}/81",
        snap.difficulty,
        format_time(snap.elapsed_secs),
        snap.player.filled_count()
    );
    if snap.completed {
        out.push_str("  solved");
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sudoku_core::{Difficulty, PlayerGrid, SolutionGrid, VisibilityMask};

    const SOLVED: &str =
        "534678912672195348198342567859761423426853791713924856961537284287419635345286179";

    fn snapshot() -> SessionSnapshot {
        let solution = SolutionGrid::from_string(SOLVED).unwrap();
        let mask = VisibilityMask::from_string(&"110".repeat(27)).unwrap();
        SessionSnapshot {
            player: PlayerGrid::from_solution(&solution, &mask),
            solution,
            mask,
            difficulty: Difficulty::Easy,
            elapsed_secs: 65,
            selected: None,
            completed: false,
        }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(3725), "1:02:05");
    }

    #[test]
    fn test_board_layout() {
        let text = board(&snapshot());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "5 3 . | 6 7 . | 9 1 .");
        assert_eq!(lines[3], "------+-------+------");
        assert_eq!(lines.last(), Some(&"Easy  01:05  54/81"));
    }

    #[test]
    fn test_selected_cell_is_bracketed() {
        let mut snap = snapshot();
        snap.selected = Some(Position::new(0, 2));
        snap.completed = true;
        let text = board(&snap);
        assert!(text.starts_with("5 3 [.]| 6 7 ."));
        assert!(text.trim_end().ends_with("solved"));
    }
}
