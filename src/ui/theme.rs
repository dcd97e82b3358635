//! Terminal styling for CLI status lines
//!
//! Status lines go to stdout and problems go to stderr, so each stream gets its
//! own theme based on whether that stream is a color-capable terminal.

use console::Term;
use owo_colors::Style;
use std::sync::OnceLock;

static STDOUT_THEME: OnceLock<Theme> = OnceLock::new();
static STDERR_THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    /// Banner and section titles
    pub title: Style,
    pub ok: Style,
    pub failure: Style,
    pub caution: Style,
    /// Leading status icons
    pub marker: Style,
    /// Field labels in `label: value` rows
    pub label: Style,
}

impl Theme {
    pub fn for_term(term: &Term) -> Self {
        if term.is_term() && console::colors_enabled() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub fn colored() -> Self {
        Self {
            title: Style::new().blue().bold(),
            ok: Style::new().green().bold(),
            failure: Style::new().red().bold(),
            caution: Style::new().yellow().bold(),
            marker: Style::new().cyan(),
            label: Style::new().bright_black(),
        }
    }

    pub fn plain() -> Self {
        Self {
            title: Style::new(),
            ok: Style::new(),
            failure: Style::new(),
            caution: Style::new(),
            marker: Style::new(),
            label: Style::new(),
        }
    }
}

/// Theme for lines written to stdout
pub fn theme() -> &'static Theme {
    STDOUT_THEME.get_or_init(|| Theme::for_term(&Term::stdout()))
}

/// Theme for lines written to stderr
pub fn error_theme() -> &'static Theme {
    STDERR_THEME.get_or_init(|| Theme::for_term(&Term::stderr()))
}
