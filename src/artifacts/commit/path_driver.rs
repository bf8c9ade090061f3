//! Path-driven editor walk
//!
//! Given a flat set of paths, [`drive`] visits them in parent-before-child
//! order, opening intermediate directories as needed so that every callback
//! receives the baton of its immediate parent. The callback may return a new
//! directory baton (an added directory), which becomes the parent for the
//! paths below it; all directory batons, the root included, are closed
//! innermost-first before the drive returns.

use crate::areas::editor::{CommitEditor, DirBaton};
use crate::artifacts::paths::longest_common_path;
use crate::artifacts::revision::Revnum;
use crate::error::Result;

/// The per-path action. Returning `Some(baton)` keeps the directory open for
/// the paths below it.
pub type PathDriverCallback<'a> =
    dyn FnMut(&mut dyn CommitEditor, &DirBaton, &str) -> Result<Option<DirBaton>> + 'a;

/// Drive `editor` over `paths` in depth-first order. `base_rev` anchors every
/// opened directory.
pub fn drive(
    editor: &mut dyn CommitEditor,
    base_rev: Option<Revnum>,
    paths: &[String],
    callback: &mut PathDriverCallback<'_>,
) -> Result<()> {
    let mut sorted: Vec<&str> = paths.iter().map(String::as_str).collect();
    sorted.sort_by(|a, b| a.split('/').cmp(b.split('/')));

    let root = editor.open_root(base_rev)?;
    let mut stack: Vec<(String, DirBaton)> = vec![(String::new(), root)];
    let mut last_path: Option<&str> = None;

    let result = (|| {
        for path in &sorted {
            // Close everything below the common ancestor of this path and
            // the previous one.
            if let Some(last) = last_path {
                let common = longest_common_path(last, path);
                while stack.len() > 1 {
                    match stack.last() {
                        Some((top, _)) if top.len() > common.len() => {
                            if let Some((_, baton)) = stack.pop() {
                                editor.close_directory(baton)?;
                            }
                        }
                        _ => break,
                    }
                }
            }

            // Open the intermediate directories between the stack top and
            // this path's parent.
            let (mut opened, mut parent_baton) = match stack.last() {
                Some((top, baton)) => (top.clone(), baton.clone()),
                None => return Err(stack_underflow()),
            };
            let parent = rel_dirname(path);
            if parent.len() > opened.len() {
                let missing = if opened.is_empty() {
                    parent
                } else {
                    &parent[opened.len() + 1..]
                };
                for component in missing.split('/') {
                    opened = if opened.is_empty() {
                        component.to_string()
                    } else {
                        format!("{opened}/{component}")
                    };
                    let baton = editor.open_directory(&opened, &parent_baton, base_rev)?;
                    stack.push((opened.clone(), baton.clone()));
                    parent_baton = baton;
                }
            }

            if let Some(child) = callback(editor, &parent_baton, path)? {
                stack.push((path.to_string(), child));
            }
            last_path = Some(path);
        }
        Ok(())
    })();

    // Close whatever is still open, innermost first, even after an error so
    // the caller can abort a consistent edit.
    while let Some((_, baton)) = stack.pop() {
        if result.is_ok() {
            editor.close_directory(baton)?;
        } else {
            let _ = editor.close_directory(baton);
        }
    }

    result
}

fn rel_dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

fn stack_underflow() -> crate::error::Error {
    crate::error::Error::new(
        crate::error::ErrorKind::Base,
        "path driver directory stack underflow",
    )
}
