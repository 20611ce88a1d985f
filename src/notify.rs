use crate::row::RowId;
use indexmap::IndexMap;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Something interested in changes to a document.
pub trait NotifierTarget {
    /// `producer` is the row the change happened on, when there is one.
    fn handle_notification(&self, producer: Option<RowId>, name: &str, data: Option<&dyn Any>);
}

struct Registration {
    seq: u64,
    target: Weak<dyn NotifierTarget>,
}

/// Routes change notifications from a document to its listeners.
///
/// Listeners register against ids such as `gcs.character.skill.Points`. An id ending
/// in `.` is a prefix and matches every id beneath it. Listeners are held weakly; once
/// dropped they are pruned on the next delivery.
#[derive(Default)]
pub struct Notifier {
    targets: RefCell<IndexMap<String, Vec<Registration>>>,
    next_seq: Cell<u64>,
    suppressed: Cell<u32>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("names", &self.targets.borrow().keys().collect::<Vec<_>>())
            .field("suppressed", &self.suppressed.get())
            .finish()
    }
}

fn same_target(a: &Weak<dyn NotifierTarget>, b: &Weak<dyn NotifierTarget>) -> bool {
    std::ptr::addr_eq(a.as_ptr(), b.as_ptr())
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `target` for each of `names`. A target keeps its original position in
    /// the delivery order when it registers for more names later.
    pub fn add<T: NotifierTarget + 'static>(&self, target: &Rc<T>, names: &[&str]) {
        let weak: Weak<dyn NotifierTarget> = Rc::downgrade(target) as Weak<dyn NotifierTarget>;
        let mut targets = self.targets.borrow_mut();
        let seq = targets
            .values()
            .flatten()
            .find(|reg| same_target(&reg.target, &weak))
            .map(|reg| reg.seq)
            .unwrap_or_else(|| {
                let seq = self.next_seq.get();
                self.next_seq.set(seq + 1);
                seq
            });
        for name in names {
            let list = targets.entry((*name).to_string()).or_default();
            if !list.iter().any(|reg| reg.seq == seq) {
                list.push(Registration {
                    seq,
                    target: weak.clone(),
                });
            }
        }
    }

    /// Removes every registration of `target`.
    pub fn remove<T: NotifierTarget + 'static>(&self, target: &Rc<T>) {
        let weak: Weak<dyn NotifierTarget> = Rc::downgrade(target) as Weak<dyn NotifierTarget>;
        let mut targets = self.targets.borrow_mut();
        for list in targets.values_mut() {
            list.retain(|reg| !same_target(&reg.target, &weak));
        }
        targets.retain(|_, list| !list.is_empty());
    }

    /// Number of distinct live listeners.
    pub fn listener_count(&self) -> usize {
        let targets = self.targets.borrow();
        let mut seqs: Vec<u64> = targets
            .values()
            .flatten()
            .filter(|reg| reg.target.strong_count() > 0)
            .map(|reg| reg.seq)
            .collect();
        seqs.sort_unstable();
        seqs.dedup();
        seqs.len()
    }

    pub fn suppress(&self) {
        self.suppressed.set(self.suppressed.get() + 1);
    }

    pub fn resume(&self) {
        let count = self.suppressed.get();
        debug_assert!(count > 0, "resume without matching suppress");
        if count == 0 {
            log::error!("notifier resumed more often than it was suppressed");
            return;
        }
        self.suppressed.set(count - 1);
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed.get() > 0
    }

    /// Delivers `name` to every matching listener, synchronously and in registration
    /// order. Nothing is delivered while suppressed.
    pub fn notify(&self, producer: Option<RowId>, name: &str, data: Option<&dyn Any>) {
        if self.is_suppressed() {
            return;
        }

        // Copy the matches out so listeners may add or remove registrations.
        let mut matches: Vec<(u64, Weak<dyn NotifierTarget>)> = {
            let targets = self.targets.borrow();
            targets
                .iter()
                .filter(|(key, _)| {
                    key.as_str() == name || (key.ends_with('.') && name.starts_with(key.as_str()))
                })
                .flat_map(|(_, list)| list.iter().map(|reg| (reg.seq, reg.target.clone())))
                .collect()
        };
        matches.sort_by_key(|(seq, _)| *seq);
        matches.dedup_by_key(|(seq, _)| *seq);

        let mut saw_dead = false;
        for (_, target) in matches {
            match target.upgrade() {
                Some(target) => target.handle_notification(producer, name, data),
                None => saw_dead = true,
            }
        }
        if saw_dead {
            self.prune();
        }
    }

    fn prune(&self) {
        let mut targets = self.targets.borrow_mut();
        for list in targets.values_mut() {
            list.retain(|reg| reg.target.strong_count() > 0);
        }
        targets.retain(|_, list| !list.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::{Notifier, NotifierTarget};
    use crate::row::RowId;
    use std::any::Any;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        tag: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl NotifierTarget for Recorder {
        fn handle_notification(&self, _: Option<RowId>, name: &str, _: Option<&dyn Any>) {
            self.log.borrow_mut().push(format!("{}:{name}", self.tag));
        }
    }

    #[test]
    fn delivers_in_registration_order_once_each() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = Rc::new(Recorder {
            tag: "a",
            log: log.clone(),
        });
        let b = Rc::new(Recorder {
            tag: "b",
            log: log.clone(),
        });
        let n = Notifier::new();
        n.add(&a, &["x.y"]);
        n.add(&b, &["x."]);
        // Registered for both the prefix and the exact id; still called once.
        n.add(&a, &["x."]);

        n.notify(None, "x.y", None);
        assert_eq!(*log.borrow(), vec!["a:x.y", "b:x.y"]);

        log.borrow_mut().clear();
        n.notify(None, "x.z", None);
        assert_eq!(*log.borrow(), vec!["a:x.z", "b:x.z"]);

        log.borrow_mut().clear();
        n.notify(None, "xy", None);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn dropped_listeners_are_pruned() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = Rc::new(Recorder {
            tag: "a",
            log: log.clone(),
        });
        let n = Notifier::new();
        n.add(&a, &["id"]);
        assert_eq!(n.listener_count(), 1);
        drop(a);
        n.notify(None, "id", None);
        assert_eq!(n.listener_count(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn suppression_nests() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = Rc::new(Recorder {
            tag: "a",
            log: log.clone(),
        });
        let n = Notifier::new();
        n.add(&a, &["id"]);
        n.suppress();
        n.suppress();
        n.resume();
        n.notify(None, "id", None);
        assert!(log.borrow().is_empty());
        n.resume();
        n.notify(None, "id", None);
        assert_eq!(log.borrow().len(), 1);

        n.remove(&a);
        n.notify(None, "id", None);
        assert_eq!(log.borrow().len(), 1);
    }
}
