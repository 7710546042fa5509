use crate::calculation::Calculation;
use crate::error::{AbacusError, AbacusResult};
use crate::persistence::HistoryStore;
use log::{info, warn};
use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

/// Subscriber notified synchronously after every committed calculation
pub trait HistoryObserver {
    /// Short name used in diagnostics
    fn name(&self) -> &str;

    /// Called with the new record and the active history that now ends with it
    fn on_new_record(&self, record: &Calculation, active: &[Calculation]) -> AbacusResult<()>;
}

/// Ordered list of observers. Duplicates are allowed and notified once per registration.
#[derive(Default, Clone)]
pub struct ObserverRegistry {
    observers: Vec<Rc<dyn HistoryObserver>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(&mut self, observer: Rc<dyn HistoryObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.observers.iter().map(|o| o.name().to_string()).collect()
    }

    /// Notify every observer in registration order.
    ///
    /// The first failure stops the fan-out and is returned; observers
    /// registered after the failing one are not called.
    pub fn notify_all(&self, record: &Calculation, active: &[Calculation]) -> AbacusResult<()> {
        for observer in &self.observers {
            if let Err(e) = observer.on_new_record(record, active) {
                warn!("Observer '{}' failed: {}", observer.name(), e);
                return Err(e);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Saves the whole active history after every commit
#[derive(Debug)]
pub struct AutoPersistObserver {
    store: HistoryStore,
}

impl AutoPersistObserver {
    pub fn new(store: HistoryStore) -> Self {
        Self { store }
    }
}

impl HistoryObserver for AutoPersistObserver {
    fn name(&self) -> &str {
        "auto-persist"
    }

    fn on_new_record(&self, _record: &Calculation, active: &[Calculation]) -> AbacusResult<()> {
        self.store.save(active)?;
        Ok(())
    }
}

/// Appends one line per committed calculation to a sink
pub struct AuditLogObserver<W: Write> {
    sink: RefCell<W>,
}

impl<W: Write> AuditLogObserver<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink: RefCell::new(sink),
        }
    }

    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }
}

impl AuditLogObserver<File> {
    /// Open `path` for appending, creating it and its directory when missing
    pub fn open(path: &Path) -> AbacusResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write> HistoryObserver for AuditLogObserver<W> {
    fn name(&self) -> &str {
        "audit-log"
    }

    fn on_new_record(&self, record: &Calculation, _active: &[Calculation]) -> AbacusResult<()> {
        info!(
            "Calculation performed: {} ({}, {}) = {}",
            record.operation(),
            record.operand_a(),
            record.operand_b(),
            record.result()
        );

        let mut sink = self.sink.borrow_mut();
        writeln!(sink, "{} {}", record.timestamp().to_rfc3339(), record)
            .and_then(|_| sink.flush())
            .map_err(|e| AbacusError::observer(self.name(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use crate::operations::Operation;
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    fn add(a: i64, b: i64) -> Calculation {
        Calculation::compute(Operation::Add, Decimal::from(a), Decimal::from(b), 10).unwrap()
    }

    struct Recorder {
        label: &'static str,
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl HistoryObserver for Recorder {
        fn name(&self) -> &str {
            self.label
        }

        fn on_new_record(&self, record: &Calculation, _active: &[Calculation]) -> AbacusResult<()> {
            self.calls.borrow_mut().push(format!("{}:{}", self.label, record));
            Ok(())
        }
    }

    struct Failing;

    impl HistoryObserver for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn on_new_record(&self, _record: &Calculation, _active: &[Calculation]) -> AbacusResult<()> {
            Err(AbacusError::repl("sink unavailable"))
        }
    }

    #[test]
    fn test_notify_in_registration_order() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ObserverRegistry::new();
        registry.add_observer(Rc::new(Recorder { label: "first", calls: calls.clone() }));
        registry.add_observer(Rc::new(Recorder { label: "second", calls: calls.clone() }));

        let record = add(1, 2);
        registry.notify_all(&record, std::slice::from_ref(&record)).unwrap();

        assert_eq!(
            *calls.borrow(),
            vec!["first:add(1, 2) = 3".to_string(), "second:add(1, 2) = 3".to_string()]
        );
    }

    #[test]
    fn test_failure_stops_fan_out() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ObserverRegistry::new();
        registry.add_observer(Rc::new(Failing));
        registry.add_observer(Rc::new(Recorder { label: "after", calls: calls.clone() }));

        let record = add(1, 2);
        assert!(registry.notify_all(&record, &[]).is_err());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let observer: Rc<dyn HistoryObserver> = Rc::new(Recorder { label: "dup", calls: calls.clone() });
        let mut registry = ObserverRegistry::new();
        registry.add_observer(observer.clone());
        registry.add_observer(observer);

        registry.notify_all(&add(1, 1), &[]).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn test_auto_persist_saves_active_history() {
        let temp_dir = tempdir().unwrap();
        let store = HistoryStore::new(temp_dir.path().join("history.json"));
        let observer = AutoPersistObserver::new(store.clone());

        let active = vec![add(1, 1), add(2, 2)];
        observer.on_new_record(&active[1], &active).unwrap();

        assert_eq!(store.load().unwrap(), active);
    }

    #[test]
    fn test_audit_log_writes_lines() {
        let observer = AuditLogObserver::new(Vec::new());
        observer.on_new_record(&add(2, 3), &[]).unwrap();
        observer.on_new_record(&add(4, 5), &[]).unwrap();

        let text = String::from_utf8(observer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("add(2, 3) = 5"));
        assert!(lines[1].ends_with("add(4, 5) = 9"));
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("no space left"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_audit_sink_failure_is_recoverable() {
        let observer = AuditLogObserver::new(FullDisk);
        let err = observer.on_new_record(&add(1, 1), &[]).unwrap_err();

        assert!(matches!(err, AbacusError::Observer { .. }));
        assert!(err.is_recoverable());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_audit_log_appends_to_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("logs").join("audit.log");

        AuditLogObserver::open(&path).unwrap().on_new_record(&add(1, 1), &[]).unwrap();
        AuditLogObserver::open(&path).unwrap().on_new_record(&add(2, 2), &[]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
