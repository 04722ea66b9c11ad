//! Contains the formatting logic for the [StContext] struct.

use super::StContext;
use crate::{constants::PROGRESS_DOT, errors::StResult, git::GitRunner};
use nu_ansi_term::Color;

impl<G: GitRunner> StContext<G> {
    /// Renders the current stack, marking the checked out branch.
    ///
    /// ## Returns
    /// - `Ok(String)` - The rendered stack, or a hint to save a diff if the stack is empty.
    /// - `Err(_)` - If the current stack could not be loaded.
    pub fn render_stack(&self) -> StResult<String> {
        let stack = self.current_stack()?;
        if stack.is_empty() {
            return Ok(format!(
                "Stack `{}` is empty. Save a diff with `stacked save`.\n",
                Color::Blue.paint(stack.title())
            ));
        }

        let base = self.store.base_branch(stack.title())?;
        let checked_out = self.git.current_branch().ok();

        let mut buf = String::new();
        stack.write_stack(&mut buf, base.as_deref(), checked_out.as_deref())?;
        Ok(buf)
    }
}

/// Formats a progress line, with any further `lines` indented below it.
pub(crate) fn progress(title: &str, lines: &[&str]) -> String {
    let dot = Color::Blue.paint(PROGRESS_DOT.to_string());
    if lines.is_empty() {
        format!("{} {}", dot, title)
    } else {
        format!("{} {}\n  {}", dot, title, lines.join("\n  "))
    }
}

#[cfg(test)]
mod test {
    use super::progress;
    use crate::ctx::test::{context, seed};

    #[test]
    fn progress_indents_body() {
        let line = progress("Updating branches:", &["a, b"]);
        assert!(line.ends_with("Updating branches:\n  a, b"));
    }

    #[test]
    fn empty_stack_renders_hint() {
        let (_dir, ctx) = context(Some("stack"));
        let rendered = ctx.render_stack().unwrap();
        assert!(rendered.contains("is empty"));
    }

    #[test]
    fn renders_refs_in_order() {
        let (_dir, ctx) = context(Some("stack"));
        seed(&ctx, "stack", &["1", "2"]);
        ctx.git
            .expect(&["symbolic-ref", "--quiet", "--short", "HEAD"], "Branch1\n");

        let rendered = ctx.render_stack().unwrap();
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("● Branch1"));
        assert!(lines[2].contains("○ Branch2"));
    }
}
