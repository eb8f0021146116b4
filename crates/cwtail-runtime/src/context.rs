//! Terminal helpers for the binary.

use std::io::IsTerminal;

use crate::cli::ColorArg;

/// Resolve `--color` for stdout (event lines).
pub fn stdout_color(color: ColorArg) -> bool {
    resolve_color(color, std::io::stdout().is_terminal())
}

/// Resolve `--color` for stderr (status lines).
pub fn stderr_color(color: ColorArg) -> bool {
    resolve_color(color, std::io::stderr().is_terminal())
}

fn resolve_color(color: ColorArg, is_terminal: bool) -> bool {
    match color {
        ColorArg::Always => true,
        ColorArg::Never => false,
        ColorArg::Auto => is_terminal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_settings_win() {
        assert!(resolve_color(ColorArg::Always, false));
        assert!(!resolve_color(ColorArg::Never, true));
    }

    #[test]
    fn auto_follows_the_terminal() {
        assert!(resolve_color(ColorArg::Auto, true));
        assert!(!resolve_color(ColorArg::Auto, false));
    }
}
