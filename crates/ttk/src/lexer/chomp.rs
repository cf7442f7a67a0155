//! Whitespace chomping around directives.

/// How whitespace adjacent to a directive is trimmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Chomp {
    /// Leave whitespace untouched (`+`).
    #[default]
    None,
    /// Remove one line's worth of whitespace including its newline (`-`).
    One,
    /// Replace the whitespace run, even an empty one, with a single space
    /// (`=`). Empty neighbouring text is left empty.
    Collapse,
    /// Remove all of the whitespace run (`~`).
    Greedy,
}

impl Chomp {
    /// Interpret a chomp flag character.
    pub fn from_flag(flag: char) -> Option<Chomp> {
        match flag {
            '+' => Some(Chomp::None),
            '-' => Some(Chomp::One),
            '=' => Some(Chomp::Collapse),
            '~' => Some(Chomp::Greedy),
            _ => None,
        }
    }

    /// Trim the text that precedes a directive.
    pub(crate) fn apply_pre(self, text: &mut String) {
        match self {
            Chomp::None => {}
            Chomp::One => {
                let trimmed = text.trim_end_matches(is_horizontal_space).len();
                let cut = if text[..trimmed].ends_with('\n') {
                    trimmed - 1
                } else {
                    trimmed
                };
                text.truncate(cut);
            }
            Chomp::Collapse => {
                if !text.is_empty() {
                    let trimmed = text.trim_end().len();
                    text.truncate(trimmed);
                    text.push(' ');
                }
            }
            Chomp::Greedy => {
                let trimmed = text.trim_end().len();
                text.truncate(trimmed);
            }
        }
    }

    /// Trim the text that follows a directive, returning the kept part.
    pub(crate) fn apply_post(self, text: &str) -> String {
        match self {
            Chomp::None => text.to_string(),
            Chomp::One => {
                let rest = text.trim_start_matches(is_horizontal_space);
                match rest.strip_prefix('\n') {
                    Some(after) => after.to_string(),
                    None => text.to_string(),
                }
            }
            Chomp::Collapse if text.is_empty() => String::new(),
            Chomp::Collapse => format!(" {}", text.trim_start()),
            Chomp::Greedy => text.trim_start().to_string(),
        }
    }
}

fn is_horizontal_space(c: char) -> bool {
    c.is_whitespace() && c != '\n'
}
