use terminal_size::{Width, terminal_size};

/// Width to use for clap's help output. `reserve` columns are kept
/// free at the right edge. Falls back to 120 when stdout is not a
/// terminal.
pub fn get_terminal_width(reserve: usize) -> usize {
    if let Some((Width(width), _)) = terminal_size() {
        usize::from(width).saturating_sub(reserve).max(40)
    } else {
        120
    }
}
