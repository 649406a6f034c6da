use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::debug;

use orderdesk_core::domain::record::Record;

/// Monotonic request number handed out by [`EntityCache::begin`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CacheTicket(u64);

/// Observable list state for one entity kind.
///
/// By default the last resolution to publish wins. With `discard_stale` set, a resolution whose
/// ticket was superseded by a newer request is dropped.
pub struct EntityCache<T: Record> {
    sender: watch::Sender<Vec<T>>,
    issued: AtomicU64,
    discard_stale: bool,
}

impl<T: Record> EntityCache<T> {
    pub fn new(discard_stale: bool) -> Self {
        let (sender, _) = watch::channel(Vec::new());
        Self { sender, issued: AtomicU64::new(0), discard_stale }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.sender.subscribe()
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.sender.borrow().clone()
    }

    pub fn begin(&self) -> CacheTicket {
        CacheTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Replaces the cached list. Returns `false` when the result was discarded as stale.
    pub fn publish(&self, ticket: CacheTicket, items: Vec<T>) -> bool {
        let latest = self.issued.load(Ordering::SeqCst);
        if self.discard_stale && ticket.0 < latest {
            debug!(
                event_name = "cache.publish.stale_discarded",
                entity = %T::KIND,
                ticket = ticket.0,
                latest,
                "superseded result not published"
            );
            return false;
        }

        self.sender.send_replace(items);
        true
    }

    /// Replace-by-id, or append when the id is new.
    pub fn upsert(&self, record: T) {
        self.sender.send_modify(|items| {
            match items.iter_mut().find(|existing| existing.id() == record.id()) {
                Some(existing) => *existing = record,
                None => items.push(record),
            }
        });
    }

    /// Replace-by-id only; a record absent from the cached list stays absent.
    pub fn replace(&self, record: T) -> bool {
        self.sender.send_if_modified(|items| {
            match items.iter_mut().find(|existing| existing.id() == record.id()) {
                Some(existing) => {
                    *existing = record;
                    true
                }
                None => false,
            }
        })
    }

    pub fn remove(&self, id: i64) {
        self.sender.send_modify(|items| items.retain(|existing| existing.id() != id));
    }
}

#[cfg(test)]
mod tests {
    use orderdesk_core::domain::customer::Customer;

    use super::EntityCache;

    fn customer(id: i64, name: &str) -> Customer {
        Customer { cust_id: id, company_name: name.to_string(), ..Customer::default() }
    }

    #[test]
    fn last_resolution_wins_by_default() {
        let cache = EntityCache::new(false);
        let first = cache.begin();
        let second = cache.begin();

        assert!(cache.publish(second, vec![customer(2, "newer request")]));
        assert!(cache.publish(first, vec![customer(1, "older request")]));
        assert_eq!(cache.snapshot()[0].company_name, "older request");
    }

    #[test]
    fn stale_results_are_dropped_when_guarded() {
        let cache = EntityCache::new(true);
        let first = cache.begin();
        let second = cache.begin();

        assert!(cache.publish(second, vec![customer(2, "newer request")]));
        assert!(!cache.publish(first, vec![customer(1, "older request")]));
        assert_eq!(cache.snapshot()[0].company_name, "newer request");
    }

    #[tokio::test]
    async fn subscribers_see_merged_mutations() {
        let cache = EntityCache::new(false);
        let mut receiver = cache.subscribe();
        let ticket = cache.begin();
        cache.publish(ticket, vec![customer(1, "A"), customer(2, "B")]);

        cache.upsert(customer(2, "B2"));
        cache.upsert(customer(3, "C"));
        cache.remove(1);

        receiver.changed().await.expect("cache sender alive");
        let names: Vec<String> =
            receiver.borrow().iter().map(|customer| customer.company_name.clone()).collect();
        assert_eq!(names, vec!["B2", "C"]);
    }

    #[test]
    fn replace_never_appends() {
        let cache = EntityCache::new(false);
        assert!(!cache.replace(customer(2, "Edited")));
        assert!(cache.snapshot().is_empty());

        let ticket = cache.begin();
        cache.publish(ticket, vec![customer(1, "A"), customer(2, "B")]);
        assert!(cache.replace(customer(2, "Edited")));
        let names: Vec<String> =
            cache.snapshot().into_iter().map(|customer| customer.company_name).collect();
        assert_eq!(names, vec!["A", "Edited"]);
    }
}
