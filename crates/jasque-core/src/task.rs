//! Markdown checkbox tasks: scanning, identifier resolution and completion.
//!
//! A task is any line of the form `- [ ] text` or `- [x] text`, optionally
//! indented. Tasks are addressed by line number, by exact text or by a unique
//! text fragment, in that order.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::VaultError;

static TASK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\s*)-\s*\[([ xX])\]\s*(.+)$").expect("task regex"));

/// One checkbox occurrence inside a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkbox {
    /// Byte span of the whole match in the scanned content.
    pub span: Range<usize>,
    /// 1-based line number: newlines before the match start, plus one.
    pub line_number: usize,
    /// Task text, trimmed.
    pub text: String,
    pub completed: bool,
    indent: Range<usize>,
    raw_text: Range<usize>,
}

impl Checkbox {
    /// The checked form of this checkbox, keeping its indentation and text.
    #[must_use]
    pub fn completed_line(&self, content: &str) -> String {
        format!(
            "{}- [x] {}",
            &content[self.indent.clone()],
            &content[self.raw_text.clone()]
        )
    }
}

/// Find every checkbox in `content`, in document order.
#[must_use]
pub fn scan_checkboxes(content: &str) -> Vec<Checkbox> {
    TASK_RE
        .captures_iter(content)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let indent = cap.get(1)?;
            let mark = cap.get(2)?;
            let text = cap.get(3)?;
            Some(Checkbox {
                span: whole.range(),
                line_number: content[..whole.start()].matches('\n').count() + 1,
                text: text.as_str().trim().to_string(),
                completed: mark.as_str().eq_ignore_ascii_case("x"),
                indent: indent.range(),
                raw_text: text.range(),
            })
        })
        .collect()
}

/// Pick the checkbox addressed by `identifier`.
///
/// An identifier that parses as an integer must name the line of an open
/// task. Any other identifier is compared case-insensitively against open
/// tasks: an exact match wins, otherwise a single substring match. `path` is
/// only used in messages.
///
/// # Errors
///
/// Returns [`VaultError::TaskNotFound`] when there are no tasks, the line is
/// not a task or is already done, or the text matches zero or several tasks.
pub fn resolve_checkbox<'a>(
    tasks: &'a [Checkbox],
    identifier: &str,
    path: &str,
) -> Result<&'a Checkbox, VaultError> {
    if tasks.is_empty() {
        return Err(VaultError::TaskNotFound(format!(
            "No tasks found in {path}. Use query_vault with operation='list_tasks' to find notes with tasks."
        )));
    }

    if let Ok(line) = identifier.trim().parse::<i64>() {
        let found = tasks
            .iter()
            .find(|task| i64::try_from(task.line_number).is_ok_and(|n| n == line));
        return match found {
            Some(task) if task.completed => Err(VaultError::TaskNotFound(format!(
                "Task at line {line} is already completed: '{}'",
                task.text
            ))),
            Some(task) => Ok(task),
            None => {
                let lines: Vec<String> = tasks.iter().map(|t| t.line_number.to_string()).collect();
                Err(VaultError::TaskNotFound(format!(
                    "No task at line {line}. Tasks at lines: {}",
                    lines.join(", ")
                )))
            }
        };
    }

    let needle = identifier.to_lowercase();
    let open = || tasks.iter().filter(|task| !task.completed);

    let exact: Vec<&Checkbox> = open().filter(|t| t.text.to_lowercase() == needle).collect();
    let candidates = if exact.is_empty() {
        open()
            .filter(|t| t.text.to_lowercase().contains(&needle))
            .collect()
    } else {
        exact
    };

    match candidates.as_slice() {
        [single] => Ok(*single),
        [] => {
            let available: Vec<String> = open().map(|t| format!("'{}'", t.text)).collect();
            let available = if available.is_empty() {
                "none".to_string()
            } else {
                available.join(", ")
            };
            Err(VaultError::TaskNotFound(format!(
                "Task not found: '{identifier}'. Available: {available}"
            )))
        }
        many => {
            let listed: Vec<String> = many
                .iter()
                .map(|t| format!("'{}' (line {})", t.text, t.line_number))
                .collect();
            Err(VaultError::TaskNotFound(format!(
                "Multiple tasks match '{identifier}': {}",
                listed.join(", ")
            )))
        }
    }
}

/// Replace exactly the checkbox's span with its checked form.
#[must_use]
pub fn mark_complete(content: &str, task: &Checkbox) -> String {
    let mut output = String::with_capacity(content.len() + 1);
    output.push_str(&content[..task.span.start]);
    output.push_str(&task.completed_line(content));
    output.push_str(&content[task.span.end..]);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TASKS: &str = "# Tasks\n\n- [ ] First task\n- [x] Done task\n  - [ ] Nested item\n- [ ] Second task\n";

    fn message(err: VaultError) -> String {
        match err {
            VaultError::TaskNotFound(msg) => msg,
            other => panic!("expected TaskNotFound, got {other:?}"),
        }
    }

    #[test]
    fn scan_finds_all_checkboxes() {
        let tasks = scan_checkboxes(TASKS);
        let texts: Vec<&str> = tasks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["First task", "Done task", "Nested item", "Second task"]);
        assert!(tasks[1].completed);
        assert!(!tasks[2].completed);
    }

    #[test]
    fn line_numbers_count_newlines_before_match() {
        // The blank line after the heading is absorbed by the leading `\s*`.
        let tasks = scan_checkboxes(TASKS);
        let lines: Vec<usize> = tasks.iter().map(|t| t.line_number).collect();
        assert_eq!(lines, vec![2, 4, 5, 6]);
    }

    #[test]
    fn uppercase_x_is_completed() {
        let tasks = scan_checkboxes("- [X] shouted");
        assert!(tasks[0].completed);
        assert_eq!(tasks[0].line_number, 1);
    }

    #[test]
    fn resolve_by_line_number() {
        let tasks = scan_checkboxes(TASKS);
        let task = resolve_checkbox(&tasks, "6", "t.md").unwrap();
        assert_eq!(task.text, "Second task");
    }

    #[test]
    fn resolve_line_number_of_completed_task_fails() {
        let tasks = scan_checkboxes(TASKS);
        let msg = message(resolve_checkbox(&tasks, "4", "t.md").unwrap_err());
        assert_eq!(msg, "Task at line 4 is already completed: 'Done task'");
    }

    #[test]
    fn resolve_missing_line_lists_lines() {
        let tasks = scan_checkboxes(TASKS);
        let msg = message(resolve_checkbox(&tasks, "99", "t.md").unwrap_err());
        assert_eq!(msg, "No task at line 99. Tasks at lines: 2, 4, 5, 6");
    }

    #[test]
    fn resolve_exact_before_substring() {
        let content = "- [ ] Review\n- [ ] Review PR\n";
        let tasks = scan_checkboxes(content);
        let task = resolve_checkbox(&tasks, "review", "t.md").unwrap();
        assert_eq!(task.text, "Review");
    }

    #[test]
    fn resolve_unique_substring() {
        let tasks = scan_checkboxes(TASKS);
        let task = resolve_checkbox(&tasks, "nested", "t.md").unwrap();
        assert_eq!(task.line_number, 5);
    }

    #[test]
    fn resolve_ambiguous_substring_lists_matches() {
        let tasks = scan_checkboxes(TASKS);
        let msg = message(resolve_checkbox(&tasks, "task", "t.md").unwrap_err());
        assert_eq!(
            msg,
            "Multiple tasks match 'task': 'First task' (line 2), 'Second task' (line 6)"
        );
    }

    #[test]
    fn resolve_duplicate_exact_is_ambiguous() {
        let tasks = scan_checkboxes("- [ ] Same\n- [ ] same\n");
        let msg = message(resolve_checkbox(&tasks, "SAME", "t.md").unwrap_err());
        assert!(msg.starts_with("Multiple tasks match 'SAME'"));
    }

    #[test]
    fn resolve_ignores_completed_tasks_for_text() {
        let tasks = scan_checkboxes(TASKS);
        let msg = message(resolve_checkbox(&tasks, "Done task", "t.md").unwrap_err());
        assert_eq!(
            msg,
            "Task not found: 'Done task'. Available: 'First task', 'Nested item', 'Second task'"
        );
    }

    #[test]
    fn resolve_with_nothing_open_reports_none() {
        let tasks = scan_checkboxes("- [x] all done\n");
        let msg = message(resolve_checkbox(&tasks, "other", "t.md").unwrap_err());
        assert_eq!(msg, "Task not found: 'other'. Available: none");
    }

    #[test]
    fn resolve_without_tasks() {
        let msg = message(resolve_checkbox(&[], "1", "notes/empty.md").unwrap_err());
        assert!(msg.starts_with("No tasks found in notes/empty.md."));
        assert!(msg.contains("list_tasks"));
    }

    #[test]
    fn mark_complete_rewrites_only_the_span() {
        let tasks = scan_checkboxes(TASKS);
        let nested = resolve_checkbox(&tasks, "nested", "t.md").unwrap();
        let updated = mark_complete(TASKS, nested);
        assert_eq!(
            updated,
            "# Tasks\n\n- [ ] First task\n- [x] Done task\n  - [x] Nested item\n- [ ] Second task\n"
        );
    }

    #[test]
    fn mark_complete_normalizes_spacing() {
        let content = "-   [ ]    spaced out\n";
        let tasks = scan_checkboxes(content);
        assert_eq!(mark_complete(content, &tasks[0]), "- [x] spaced out\n");
    }

    proptest! {
        #[test]
        fn every_task_line_is_found(texts in proptest::collection::vec("[a-z]{1,12}", 1..8)) {
            let content: String = texts
                .iter()
                .map(|t| format!("- [ ] {t}\n"))
                .collect();
            let tasks = scan_checkboxes(&content);
            prop_assert_eq!(tasks.len(), texts.len());
            for (i, task) in tasks.iter().enumerate() {
                prop_assert_eq!(task.line_number, i + 1);
                prop_assert_eq!(&task.text, &texts[i]);
            }
        }

        #[test]
        fn completing_preserves_other_tasks(
            texts in proptest::collection::vec("[a-z]{1,12}", 1..8),
            pick in 0usize..8,
        ) {
            let content: String = texts
                .iter()
                .map(|t| format!("- [ ] {t}\n"))
                .collect();
            let tasks = scan_checkboxes(&content);
            let index = pick % tasks.len();
            let updated = mark_complete(&content, &tasks[index]);
            let after = scan_checkboxes(&updated);
            prop_assert_eq!(after.len(), tasks.len());
            for (i, task) in after.iter().enumerate() {
                prop_assert_eq!(task.completed, i == index);
                prop_assert_eq!(&task.text, &tasks[i].text);
            }
        }
    }
}
