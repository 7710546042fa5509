use crate::calculation::Calculation;
use crate::error::AbacusResult;
use crate::observers::{HistoryObserver, ObserverRegistry};
use crate::operations::{InputValidator, Operation};
use crate::DEFAULT_MAX_HISTORY_SIZE;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::rc::Rc;

/// Tunables for the history engine
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    /// Upper bound on stored records, 0 for unbounded
    pub max_size: usize,
    /// Decimal places results are rounded to
    pub precision: u32,
    /// Largest operand magnitude accepted
    pub max_input_value: Decimal,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_HISTORY_SIZE,
            precision: crate::DEFAULT_PRECISION,
            max_input_value: InputValidator::default().max_input_value(),
        }
    }
}

/// Linear undo/redo log of calculations.
///
/// `log[..cursor]` is the active history and `log[cursor..]` holds the
/// records that were undone and can still be redone. Committing a new record
/// drops that redoable tail.
#[derive(Debug)]
pub struct History {
    log: Vec<Calculation>,
    cursor: usize,
    options: HistoryOptions,
    validator: InputValidator,
    observers: ObserverRegistry,
}

impl History {
    pub fn new(options: HistoryOptions) -> Self {
        Self::with_observers(options, Vec::new())
    }

    pub fn with_observers(options: HistoryOptions, observers: Vec<Rc<dyn HistoryObserver>>) -> Self {
        let mut registry = ObserverRegistry::new();
        for observer in observers {
            registry.add_observer(observer);
        }

        Self {
            log: Vec::new(),
            cursor: 0,
            validator: InputValidator::new(options.max_input_value),
            options,
            observers: registry,
        }
    }

    pub fn add_observer(&mut self, observer: Rc<dyn HistoryObserver>) {
        self.observers.add_observer(observer);
    }

    pub fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }

    pub fn options(&self) -> &HistoryOptions {
        &self.options
    }

    /// Parse the operands, evaluate `operation`, commit the record and notify observers.
    ///
    /// Parse and arithmetic failures leave the history untouched. An observer
    /// failure is returned after the record has already been committed.
    pub fn perform(&mut self, operation: Operation, a_raw: &str, b_raw: &str) -> AbacusResult<Calculation> {
        let a = self.validator.parse(a_raw)?;
        let b = self.validator.parse(b_raw)?;
        let record = Calculation::compute(operation, a, b, self.options.precision)?;

        self.commit(record.clone());
        self.observers.notify_all(&record, &self.log[..self.cursor])?;

        Ok(record)
    }

    fn commit(&mut self, record: Calculation) {
        let discarded = self.log.len() - self.cursor;
        if discarded > 0 {
            debug!("Discarding {} redoable calculations", discarded);
        }
        self.log.truncate(self.cursor);
        self.log.push(record);
        self.enforce_bound();
        self.cursor = self.log.len();
        debug!("Committed calculation #{}", self.cursor);
    }

    fn enforce_bound(&mut self) {
        let max = self.options.max_size;
        if max > 0 && self.log.len() > max {
            let excess = self.log.len() - max;
            warn!("History exceeds {} entries, evicting the {} oldest", max, excess);
            self.log.drain(..excess);
        }
    }

    /// Step the cursor back one record. Returns false when nothing is active.
    pub fn undo(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        debug!("Undo: cursor now {}", self.cursor);
        true
    }

    /// Step the cursor forward one record without notifying observers.
    pub fn redo(&mut self) -> bool {
        if self.cursor == self.log.len() {
            return false;
        }
        self.cursor += 1;
        debug!("Redo: cursor now {}", self.cursor);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.log.len()
    }

    /// Active history formatted as `op(a, b) = result`, oldest first
    pub fn show(&self) -> Vec<String> {
        self.active().iter().map(|c| c.to_string()).collect()
    }

    /// Drop every record, including the redoable tail. Cannot be undone.
    pub fn clear(&mut self) {
        self.log.clear();
        self.cursor = 0;
    }

    /// Replace the whole log with `records` and place the cursor at its end
    pub fn replace(&mut self, records: Vec<Calculation>) {
        self.log = records;
        self.enforce_bound();
        self.cursor = self.log.len();
    }

    pub fn active(&self) -> &[Calculation] {
        &self.log[..self.cursor]
    }

    pub fn redoable(&self) -> &[Calculation] {
        &self.log[self.cursor..]
    }

    /// Most recent active record
    pub fn current(&self) -> Option<&Calculation> {
        self.active().last()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Total stored records, active and redoable
    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(HistoryOptions::default())
    }
}
