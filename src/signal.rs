use tokio::sync::watch;

/// Data sets a mutation can invalidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Properties,
    Clients,
    Templates,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Versions {
    properties: u64,
    clients: u64,
    templates: u64,
}

impl Versions {
    fn get(&self, topic: Topic) -> u64 {
        match topic {
            Topic::Properties => self.properties,
            Topic::Clients => self.clients,
            Topic::Templates => self.templates,
        }
    }

    fn slot(&mut self, topic: Topic) -> &mut u64 {
        match topic {
            Topic::Properties => &mut self.properties,
            Topic::Clients => &mut self.clients,
            Topic::Templates => &mut self.templates,
        }
    }
}

/// Version counters that tell dependent views their data changed elsewhere.
#[derive(Debug)]
pub struct RefreshSignal {
    tx: watch::Sender<Versions>,
}

impl Default for RefreshSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Versions::default());
        Self { tx }
    }

    pub fn bump(&self, topic: Topic) {
        self.tx.send_modify(|v| *v.slot(topic) += 1);
    }

    #[cfg(test)]
    pub fn version(&self, topic: Topic) -> u64 {
        self.tx.borrow().get(topic)
    }

    /// A watcher that starts out having seen the current version.
    pub fn watch(&self, topic: Topic) -> RefreshWatcher {
        let rx = self.tx.subscribe();
        let seen = rx.borrow().get(topic);
        RefreshWatcher { rx, topic, seen }
    }
}

#[derive(Debug)]
pub struct RefreshWatcher {
    rx: watch::Receiver<Versions>,
    topic: Topic,
    seen: u64,
}

impl RefreshWatcher {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// True once per change of this watcher's topic.
    pub fn changed_since_last(&mut self) -> bool {
        let now = self.rx.borrow().get(self.topic);
        if now != self.seen {
            self.seen = now;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_is_seen_once() {
        let signal = RefreshSignal::new();
        let mut clients = signal.watch(Topic::Clients);
        assert!(!clients.changed_since_last());

        signal.bump(Topic::Clients);
        signal.bump(Topic::Clients);
        assert_eq!(signal.version(Topic::Clients), 2);
        assert!(clients.changed_since_last());
        assert!(!clients.changed_since_last());
    }

    #[test]
    fn topics_are_independent() {
        let signal = RefreshSignal::new();
        let mut properties = signal.watch(Topic::Properties);
        signal.bump(Topic::Templates);
        assert!(!properties.changed_since_last());
        assert_eq!(properties.topic(), Topic::Properties);
    }

    #[test]
    fn late_watcher_starts_current() {
        let signal = RefreshSignal::new();
        signal.bump(Topic::Properties);
        let mut properties = signal.watch(Topic::Properties);
        assert!(!properties.changed_since_last());
    }
}
