//! Formatting for the [Stack] type.

use super::{RefId, Stack};
use crate::constants::{
    BOTTOM_LEFT_BOX, COLORS, EMPTY_CIRCLE, FILLED_CIRCLE, HORIZONTAL_BOX, LEFT_FORK_BOX,
};
use nu_ansi_term::Color;
use std::fmt::{self, Display, Write};

impl Stack {
    /// Returns a vector of [DisplayRef]s for the stack, in order from first to last.
    ///
    /// This is particularly useful when creating prompts with [inquire::Select].
    pub fn display_refs(&self) -> Vec<DisplayRef> {
        self.iter()
            .enumerate()
            .map(|(i, id)| DisplayRef {
                display_value: format!("{}: {}", i + 1, self[id].description),
                branch_name: self[id].branch.clone(),
                id,
            })
            .collect()
    }

    /// Writes a pretty-printed representation of the [Stack] to the passed [Write]r.
    ///
    /// ## Takes
    /// - `w` - The writer to write the log to.
    /// - `base` - The branch the stack is based on, printed above the first ref.
    /// - `checked_out` - The name of the branch that is currently checked out.
    ///
    /// ## Returns
    /// - `Ok(_)` - Stack successfully written.
    /// - `Err(_)` - If an error occurs while writing.
    pub fn write_stack<W: Write>(
        &self,
        w: &mut W,
        base: Option<&str>,
        checked_out: Option<&str>,
    ) -> fmt::Result {
        let checked_out = checked_out.unwrap_or_default();

        writeln!(w, "{}", Color::White.bold().paint(self.title()))?;
        if let Some(base) = base {
            writeln!(w, "{} {}", EMPTY_CIRCLE, Color::White.dimmed().paint(base))?;
        }

        let mut refs = self.iter().enumerate().peekable();
        while let Some((depth, id)) = refs.next() {
            let is_last = refs.peek().is_none();
            self.write_ref(w, id, depth, is_last, checked_out)?;
        }

        Ok(())
    }

    /// Writes a single log-line for the ref `id`.
    fn write_ref<W: Write>(
        &self,
        w: &mut W,
        id: RefId,
        depth: usize,
        is_last: bool,
        checked_out: &str,
    ) -> fmt::Result {
        let stack_ref = &self[id];

        let connection = format!(
            "{}{}",
            is_last.then_some(BOTTOM_LEFT_BOX).unwrap_or(LEFT_FORK_BOX),
            HORIZONTAL_BOX
        );
        let checked_out_icon = (stack_ref.branch == checked_out)
            .then_some(FILLED_CIRCLE)
            .unwrap_or(EMPTY_CIRCLE);
        let rendered_branch = COLORS[depth % COLORS.len()]
            .paint(format!("{}{} {}", connection, checked_out_icon, stack_ref.branch));
        let review = stack_ref
            .mr
            .as_ref()
            .map(|mr| format!(" ({})", Color::Cyan.italic().paint(mr)))
            .unwrap_or_default();

        writeln!(
            w,
            "{} - {}{}",
            rendered_branch,
            Color::White.bold().paint(stack_ref.subject()),
            review
        )
    }
}

/// A pair of a display line and a branch name, which implements [Display].
#[derive(Debug, Clone)]
pub struct DisplayRef {
    /// The line to display.
    pub(crate) display_value: String,
    /// The branch name corresponding to the line.
    pub(crate) branch_name: String,
    /// The ref the line belongs to.
    pub(crate) id: RefId,
}

impl Display for DisplayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_value)
    }
}

#[cfg(test)]
mod test {
    use crate::stack::{RefFile, Stack};

    fn two_refs() -> Stack {
        Stack::from_records(
            "stack",
            vec![
                RefFile {
                    sha: "1".into(),
                    next: "2".into(),
                    branch: "b1".into(),
                    description: "first".into(),
                    mr: "https://gitlab.com/a/b/-/merge_requests/1".into(),
                    ..Default::default()
                },
                RefFile {
                    sha: "2".into(),
                    prev: "1".into(),
                    branch: "b2".into(),
                    description: "second".into(),
                    ..Default::default()
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn display_refs_are_numbered_in_order() {
        let refs = two_refs().display_refs();
        let lines = refs.iter().map(|r| r.to_string()).collect::<Vec<_>>();
        assert_eq!(lines, vec!["1: first", "2: second"]);
        assert_eq!(refs[1].branch_name, "b2");
    }

    #[test]
    fn write_stack_marks_checked_out_branch() {
        let mut buf = String::new();
        two_refs()
            .write_stack(&mut buf, Some("main"), Some("b2"))
            .unwrap();

        let lines = buf.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains("○ b1"));
        assert!(lines[2].contains("merge_requests/1"));
        assert!(lines[3].contains("● b2"));
    }
}
