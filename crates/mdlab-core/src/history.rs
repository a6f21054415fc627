//! Same-language cell history.
//!
//! A run of cell N synthesizes a program from every earlier cell sharing its
//! language. Each history entry owns exactly one output boundary in that
//! program, whatever its directive says, so segment `i` of the output stream
//! always belongs to entry `i`.

use mdlab_doc::{Cell, Directive};

use crate::error::{Error, Result};

/// One code cell of the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// 1-based index in synthesis order, which is also its output segment.
    pub index: usize,

    /// Position of the cell in the document.
    pub position: usize,

    /// Cell source.
    pub content: String,

    /// Directive carried by the cell.
    pub directive: Option<Directive>,
}

/// How an entry contributes to the synthesized program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Before the last `restart`: boundary only.
    Dropped,
    /// `skip`, `create=`, or `once` on a cell other than the current one:
    /// boundary only.
    Skipped,
    /// `global`: content goes to module scope.
    Global,
    /// Content goes inside the entry point.
    Body,
}

impl Role {
    /// Whether the entry's content is part of the program.
    pub fn contributes(self) -> bool {
        matches!(self, Self::Global | Self::Body)
    }
}

/// An entry with its role decided.
#[derive(Debug, Clone, Copy)]
pub struct PlannedEntry<'a> {
    pub entry: &'a HistoryEntry,
    pub role: Role,
    /// Whether this is the cell being run.
    pub is_current: bool,
}

/// Ordered same-language history ending at the cell being run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Collect the history for the code cell at `position`.
    ///
    /// Language ids must match exactly; prose and other languages are
    /// ignored.
    pub fn collect(cells: &[Cell], position: usize) -> Result<Self> {
        let target = cells.get(position).ok_or(Error::CellNotFound(position))?;
        if !target.is_code() {
            return Err(Error::NotACodeCell(position));
        }
        let language = target.language();

        let entries = cells[..=position]
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_code() && cell.language() == language)
            .enumerate()
            .map(|(i, (position, cell))| HistoryEntry {
                index: i + 1,
                position,
                content: cell.content.clone(),
                directive: cell.directive.clone(),
            })
            .collect();

        Ok(Self { entries })
    }

    /// Build a history from bare sources, for cells that are not in a
    /// document.
    pub fn from_sources<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<Directive>)>,
        S: Into<String>,
    {
        let entries = sources
            .into_iter()
            .enumerate()
            .map(|(i, (content, directive))| HistoryEntry {
                index: i + 1,
                position: i,
                content: content.into(),
                directive,
            })
            .collect();
        Self { entries }
    }

    /// Entries in document order.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The cell being run.
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Whether the current cell asked for its output to be left alone.
    pub fn suppresses_output(&self) -> bool {
        self.current()
            .is_some_and(|entry| entry.directive == Some(Directive::Clear))
    }

    /// Decide the role of every entry, in order.
    ///
    /// The result always has one item per entry.
    pub fn plan(&self) -> Vec<PlannedEntry<'_>> {
        let base = self
            .entries
            .iter()
            .rposition(|entry| entry.directive == Some(Directive::Restart))
            .unwrap_or(0);
        let last = self.entries.len().saturating_sub(1);

        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let is_current = i == last;
                let role = if i < base {
                    Role::Dropped
                } else {
                    match &entry.directive {
                        Some(Directive::Skip) | Some(Directive::Create(_)) => Role::Skipped,
                        Some(Directive::Once) if !is_current => Role::Skipped,
                        Some(Directive::Global) => Role::Global,
                        _ => Role::Body,
                    }
                };
                PlannedEntry {
                    entry,
                    role,
                    is_current,
                }
            })
            .collect()
    }
}
