//! Command-based undo log
//!
//! Every mutation the store performs pushes a command holding the state
//! needed to reverse it. A command is either:
//! - `Atomic`: one target key plus one inverse action
//! - `Composite`: an ordered `CommandSet` of atomic commands recorded by a
//!   single batch operation, undone together by `undo_last`
//!
//! The log is a plain LIFO stack. `undo_last_for` reaches below the top for
//! the most recent command touching a given key: it drains commands into a
//! side buffer until it finds one, reverts it, and pushes the buffer back so
//! every other command keeps its relative order.
//!
//! Reverting is delegated to the action type through [`Revert`], with the
//! caller supplying the mutable context the action operates on. The log
//! itself never inspects actions.

use docstore_core::{StoreError, StoreResult};
use std::fmt;
use tracing::debug;

/// An inverse action that can be applied to a context `Ctx`
pub trait Revert<K, Ctx> {
    /// Reverse the mutation originally applied to `target`
    fn revert(&self, target: &K, ctx: &mut Ctx) -> StoreResult<()>;
}

// ============================================================================
// Commands
// ============================================================================

/// One target key and the action that reverses its mutation
#[derive(Debug, Clone)]
pub struct AtomicCommand<K, A> {
    target: K,
    action: A,
}

impl<K, A> AtomicCommand<K, A> {
    /// Create a command for `target`
    pub fn new(target: K, action: A) -> Self {
        AtomicCommand { target, action }
    }

    /// The key this command reverses
    pub fn target(&self) -> &K {
        &self.target
    }

    /// The inverse action
    pub fn action(&self) -> &A {
        &self.action
    }
}

/// Atomic commands recorded by one batch operation, in the order applied
#[derive(Debug, Clone)]
pub struct CommandSet<K, A> {
    commands: Vec<AtomicCommand<K, A>>,
}

impl<K, A> Default for CommandSet<K, A> {
    fn default() -> Self {
        CommandSet {
            commands: Vec::new(),
        }
    }
}

impl<K: PartialEq, A> CommandSet<K, A> {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command
    pub fn add(&mut self, target: K, action: A) {
        self.commands.push(AtomicCommand::new(target, action));
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Check if any member targets `key`
    pub fn contains_target(&self, key: &K) -> bool {
        self.commands.iter().any(|cmd| &cmd.target == key)
    }

    /// Members in the order they were added
    pub fn iter(&self) -> impl Iterator<Item = &AtomicCommand<K, A>> {
        self.commands.iter()
    }
}

/// Entry on the undo log
#[derive(Debug, Clone)]
pub enum UndoCommand<K, A> {
    /// A single-document mutation
    Atomic(AtomicCommand<K, A>),
    /// A batch of single-document mutations undone as one unit
    Composite(CommandSet<K, A>),
}

impl<K: PartialEq, A> UndoCommand<K, A> {
    /// Check if this command (or any composite member) targets `key`
    pub fn targets(&self, key: &K) -> bool {
        match self {
            UndoCommand::Atomic(cmd) => &cmd.target == key,
            UndoCommand::Composite(set) => set.contains_target(key),
        }
    }
}

// ============================================================================
// UndoLog
// ============================================================================

/// LIFO log of undoable commands
#[derive(Debug, Clone)]
pub struct UndoLog<K, A> {
    commands: Vec<UndoCommand<K, A>>,
}

impl<K, A> Default for UndoLog<K, A> {
    fn default() -> Self {
        UndoLog {
            commands: Vec::new(),
        }
    }
}

impl<K: PartialEq + Clone + fmt::Display, A> UndoLog<K, A> {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commands (a composite counts once)
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if there is nothing to undo
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &UndoCommand<K, A>> {
        self.commands.iter()
    }

    /// Push a command
    pub fn push(&mut self, command: UndoCommand<K, A>) {
        self.commands.push(command);
    }

    /// Push a single-key command
    pub fn push_atomic(&mut self, target: K, action: A) {
        self.push(UndoCommand::Atomic(AtomicCommand::new(target, action)));
    }

    /// Push a batch as one composite command; empty batches are dropped
    pub fn push_set(&mut self, set: CommandSet<K, A>) {
        if !set.is_empty() {
            self.push(UndoCommand::Composite(set));
        }
    }

    /// Drop every command
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Pop and revert the most recent command
    ///
    /// A composite reverts every member, in the order they were added.
    ///
    /// # Errors
    ///
    /// `NothingToUndo` if the log is empty. If reverting fails, the members
    /// not yet reverted go back on top of the log and the error is returned.
    pub fn undo_last<Ctx>(&mut self, ctx: &mut Ctx) -> StoreResult<()>
    where
        A: Revert<K, Ctx>,
    {
        let command = self.commands.pop().ok_or(StoreError::NothingToUndo)?;
        let (leftover, result) = revert_command(command, None, ctx);
        if let Some(leftover) = leftover {
            self.commands.push(leftover);
        }
        result
    }

    /// Revert the most recent command targeting `key`, leaving the relative
    /// order of every other command unchanged
    ///
    /// For a composite, only the members targeting `key` are reverted and
    /// removed; the rest of the set stays where it was.
    ///
    /// # Errors
    ///
    /// `NothingToUndo` if the log is empty, `NoUndoForKey` if no command
    /// targets `key`. A failed revert restores the command in place.
    pub fn undo_last_for<Ctx>(&mut self, key: &K, ctx: &mut Ctx) -> StoreResult<()>
    where
        A: Revert<K, Ctx>,
    {
        if self.commands.is_empty() {
            return Err(StoreError::NothingToUndo);
        }

        let mut side_buffer = Vec::new();
        let mut found = None;
        while let Some(command) = self.commands.pop() {
            if command.targets(key) {
                found = Some(command);
                break;
            }
            side_buffer.push(command);
        }

        let result = match found {
            Some(command) => {
                let (leftover, result) = revert_command(command, Some(key), ctx);
                if let Some(leftover) = leftover {
                    self.commands.push(leftover);
                }
                result
            }
            None => Err(StoreError::NoUndoForKey {
                key: key.to_string(),
            }),
        };

        while let Some(command) = side_buffer.pop() {
            self.commands.push(command);
        }
        result
    }
}

/// Revert `command` (only members targeting `only`, when given).
///
/// Returns whatever must stay on the log: nothing when every selected member
/// was reverted and none were skipped, otherwise the remaining members in
/// their original order.
fn revert_command<K, A, Ctx>(
    command: UndoCommand<K, A>,
    only: Option<&K>,
    ctx: &mut Ctx,
) -> (Option<UndoCommand<K, A>>, StoreResult<()>)
where
    K: PartialEq + fmt::Display,
    A: Revert<K, Ctx>,
{
    match command {
        UndoCommand::Atomic(cmd) => match cmd.action.revert(&cmd.target, ctx) {
            Ok(()) => {
                debug!(target_key = %cmd.target, "undid command");
                (None, Ok(()))
            }
            Err(e) => (Some(UndoCommand::Atomic(cmd)), Err(e)),
        },
        UndoCommand::Composite(set) => {
            let mut kept = Vec::new();
            let mut result = Ok(());
            for cmd in set.commands {
                let selected = only.map_or(true, |key| &cmd.target == key);
                if !selected || result.is_err() {
                    kept.push(cmd);
                    continue;
                }
                match cmd.action.revert(&cmd.target, ctx) {
                    Ok(()) => debug!(target_key = %cmd.target, "undid batch member"),
                    Err(e) => {
                        result = Err(e);
                        kept.push(cmd);
                    }
                }
            }
            let leftover = if kept.is_empty() {
                None
            } else {
                Some(UndoCommand::Composite(CommandSet { commands: kept }))
            };
            (leftover, result)
        }
    }
}
