//! Per-site crawl frontier shared by the site's workers

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;
use url::Url;

/// Depth-first work queue with a visited set
///
/// Workers take URLs with [`Frontier::next`] and must report every taken URL
/// back through [`Frontier::complete`]. The frontier is exhausted once the
/// stack is empty and no URL is in flight; closing it drains the stack so
/// idle workers return immediately.
#[derive(Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    notify: Notify,
}

#[derive(Default)]
struct FrontierState {
    stack: Vec<Url>,
    visited: HashSet<String>,
    in_flight: usize,
    closed: bool,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a URL's path and queue it; false if the path was already seen
    pub fn push(&self, url: Url) -> bool {
        let added = {
            let mut state = self.lock();
            state.claim(url)
        };
        if added {
            self.notify.notify_waiters();
        }
        added
    }

    /// Take the next URL, waiting while other workers may still add links
    pub async fn next(&self) -> Option<Url> {
        loop {
            // Registered before inspecting the state so a concurrent
            // notify_waiters between the check and the await is not lost.
            let notified = self.notify.notified();
            {
                let mut state = self.lock();
                if state.closed {
                    return None;
                }
                if let Some(url) = state.stack.pop() {
                    state.in_flight += 1;
                    return Some(url);
                }
                if state.in_flight == 0 {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Finish a taken URL, queueing the links discovered on it
    pub fn complete(&self, links: Vec<Url>) {
        {
            let mut state = self.lock();
            // Reversed so the first link on the page is visited first
            for url in links.into_iter().rev() {
                state.claim(url);
            }
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        self.notify.notify_waiters();
    }

    /// Drain the queue and release every waiting worker
    pub fn close(&self) {
        {
            let mut state = self.lock();
            state.closed = true;
            state.stack.clear();
        }
        self.notify.notify_waiters();
    }

    /// Number of distinct paths claimed so far
    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FrontierState {
    fn claim(&mut self, url: Url) -> bool {
        if self.closed || !self.visited.insert(url.path().to_string()) {
            return false;
        }
        self.stack.push(url);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn url(path: &str) -> Url {
        Url::parse("https://example.com").unwrap().join(path).unwrap()
    }

    #[tokio::test]
    async fn test_depth_first_order() {
        let frontier = Frontier::new();
        assert!(frontier.push(url("/")));

        let root = frontier.next().await.unwrap();
        assert_eq!(root.path(), "/");
        frontier.complete(vec![url("/a"), url("/b")]);

        let first = frontier.next().await.unwrap();
        assert_eq!(first.path(), "/a");
        frontier.complete(vec![url("/a/1")]);

        assert_eq!(frontier.next().await.unwrap().path(), "/a/1");
        frontier.complete(vec![]);
        assert_eq!(frontier.next().await.unwrap().path(), "/b");
        frontier.complete(vec![]);

        assert!(frontier.next().await.is_none());
    }

    #[tokio::test]
    async fn test_paths_are_claimed_once() {
        let frontier = Frontier::new();
        assert!(frontier.push(url("/")));
        assert!(!frontier.push(url("/")));

        frontier.next().await.unwrap();
        frontier.complete(vec![url("/"), url("/a"), url("/a")]);
        assert_eq!(frontier.visited_count(), 2);

        assert_eq!(frontier.next().await.unwrap().path(), "/a");
        frontier.complete(vec![]);
        assert!(frontier.next().await.is_none());
    }

    #[tokio::test]
    async fn test_idle_worker_waits_for_in_flight_links() {
        let frontier = Arc::new(Frontier::new());
        frontier.push(url("/"));
        let root = frontier.next().await.unwrap();
        assert_eq!(root.path(), "/");

        let waiter = {
            let frontier = frontier.clone();
            tokio::spawn(async move { frontier.next().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        frontier.complete(vec![url("/late")]);
        let taken = waiter.await.unwrap().unwrap();
        assert_eq!(taken.path(), "/late");
    }

    #[tokio::test]
    async fn test_close_releases_waiters() {
        let frontier = Arc::new(Frontier::new());
        frontier.push(url("/"));
        frontier.next().await.unwrap();

        let waiter = {
            let frontier = frontier.clone();
            tokio::spawn(async move { frontier.next().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        frontier.close();
        assert!(waiter.await.unwrap().is_none());
        assert!(!frontier.push(url("/after")));
    }
}
