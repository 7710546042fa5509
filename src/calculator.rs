use crate::calculation::Calculation;
use crate::config::Config;
use crate::error::{AbacusResult, PersistError};
use crate::history::{History, HistoryOptions};
use crate::observers::{AuditLogObserver, AutoPersistObserver, HistoryObserver};
use crate::operations::create_operation;
use crate::persistence::HistoryStore;
use log::{info, warn};
use std::rc::Rc;

/// Entry point used by the interactive loop and the command line
pub struct Calculator {
    history: History,
    store: HistoryStore,
}

impl Calculator {
    /// Build a calculator wired with the observers the configuration asks for
    pub fn new(config: &Config) -> AbacusResult<Self> {
        let store = HistoryStore::new(config.history_file());
        let mut observers: Vec<Rc<dyn HistoryObserver>> = Vec::new();

        if config.logging.audit {
            observers.push(Rc::new(AuditLogObserver::open(&config.audit_file())?));
        }
        if config.history.auto_save {
            observers.push(Rc::new(AutoPersistObserver::new(store.clone())));
        }

        Ok(Self::with_observers(config.history_options(), store, observers))
    }

    pub fn with_observers(
        options: HistoryOptions,
        store: HistoryStore,
        observers: Vec<Rc<dyn HistoryObserver>>,
    ) -> Self {
        Self {
            history: History::with_observers(options, observers),
            store,
        }
    }

    pub fn add_observer(&mut self, observer: Rc<dyn HistoryObserver>) {
        self.history.add_observer(observer);
    }

    /// Look up `operation_name`, evaluate it on the raw operands and commit the result
    pub fn perform_operation(&mut self, operation_name: &str, a_raw: &str, b_raw: &str) -> AbacusResult<Calculation> {
        let operation = create_operation(operation_name)?;
        self.history.perform(operation, a_raw, b_raw)
    }

    pub fn show_history(&self) -> Vec<String> {
        self.history.show()
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        info!("History cleared");
    }

    /// Write the active history to the store
    pub fn save_history(&self) -> AbacusResult<()> {
        self.store.save(self.history.active())?;
        Ok(())
    }

    /// Replace the in-memory history with the store's contents.
    ///
    /// On failure the current history is left as it was.
    pub fn load_history(&mut self) -> AbacusResult<usize> {
        let records = self.store.load()?;
        let count = records.len();
        self.history.replace(records);
        Ok(count)
    }

    /// Load at startup, treating a missing store as an empty history
    pub fn restore(&mut self) -> AbacusResult<usize> {
        match self.load_history() {
            Err(crate::AbacusError::Persist(PersistError::FileNotFound { path })) => {
                info!("No saved history at {}", path);
                Ok(0)
            }
            Err(e) => {
                warn!("Could not restore history: {}", e);
                Err(e)
            }
            ok => ok,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }
}
