// code-chat-markdown - Chat transcript markdown rendering for the terminal
// Copyright (C) 2025  Simon Peter Rothgang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Code span link resolution: a per-thread cache read synchronously by the
//! renderer, filled by fire-and-forget resolutions that announce themselves
//! on a `LinkEvent` channel.
//!
//! Everything here lives on one thread. Resolutions are spawned with
//! `tokio::task::spawn_local`, so requesting one requires a running `LocalSet`.

mod resolver;

pub use resolver::WorkspaceResolver;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use tokio::sync::mpsc;

/// Inclusive 1-based line range inside the linked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start_line: u32,
    pub end_line: u32,
}

/// Resolution result for one code span. A link without a `uri` is not usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodespanLocationLink {
    /// Replaces the span text when shown.
    pub display_text: Option<String>,
    pub uri: Option<PathBuf>,
    pub selection: Option<SelectionRange>,
}

impl CodespanLocationLink {
    pub fn is_usable(&self) -> bool {
        self.uri.is_some()
    }
}

/// Resolves code span text to a file or symbol location.
#[async_trait(?Send)]
pub trait CodespanResolver {
    async fn resolve(&self, codespan: &str, thread_id: &str)
    -> anyhow::Result<CodespanLocationLink>;
}

/// Cache state for one `(thread, codespan)` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkLookup {
    /// Never requested.
    Unknown,
    /// Requested, result not in yet.
    Pending,
    Resolved(CodespanLocationLink),
    /// Resolution finished without a usable link. Never retried.
    NoLink,
}

/// Sent whenever a cache entry is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEvent {
    pub thread_id: String,
    pub codespan: String,
}

#[derive(Debug, Clone)]
enum Entry {
    Pending,
    Resolved(CodespanLocationLink),
    NoLink,
}

type LinkKey = (String, String);

#[derive(Clone)]
pub struct CodespanLinks {
    entries: Rc<RefCell<HashMap<LinkKey, Entry>>>,
    resolver: Rc<dyn CodespanResolver>,
    event_tx: mpsc::UnboundedSender<LinkEvent>,
}

impl CodespanLinks {
    pub fn new(resolver: Rc<dyn CodespanResolver>) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let links = Self { entries: Rc::new(RefCell::new(HashMap::new())), resolver, event_tx };
        (links, event_rx)
    }

    pub fn lookup(&self, thread_id: &str, codespan: &str) -> LinkLookup {
        let key = (thread_id.to_owned(), codespan.to_owned());
        match self.entries.borrow().get(&key) {
            None => LinkLookup::Unknown,
            Some(Entry::Pending) => LinkLookup::Pending,
            Some(Entry::Resolved(link)) => LinkLookup::Resolved(link.clone()),
            Some(Entry::NoLink) => LinkLookup::NoLink,
        }
    }

    /// Cached link for the key, starting a resolution when the key was never
    /// seen. Always returns immediately.
    pub fn link_for(&self, thread_id: &str, codespan: &str) -> Option<CodespanLocationLink> {
        match self.lookup(thread_id, codespan) {
            LinkLookup::Resolved(link) => Some(link),
            LinkLookup::Unknown => {
                self.request(thread_id, codespan);
                None
            }
            LinkLookup::Pending | LinkLookup::NoLink => None,
        }
    }

    /// Spawn a resolution for the key unless one is cached or in flight.
    pub fn request(&self, thread_id: &str, codespan: &str) {
        let key = (thread_id.to_owned(), codespan.to_owned());
        {
            let mut entries = self.entries.borrow_mut();
            if entries.contains_key(&key) {
                return;
            }
            entries.insert(key.clone(), Entry::Pending);
        }
        tracing::debug!(thread_id, codespan, "requesting codespan link");

        let links = self.clone();
        tokio::task::spawn_local(async move {
            let (thread_id, codespan) = key;
            let link = match links.resolver.resolve(&codespan, &thread_id).await {
                Ok(link) if link.is_usable() => Some(link),
                Ok(_) => None,
                Err(err) => {
                    tracing::debug!(%thread_id, %codespan, "codespan resolution failed: {err:#}");
                    None
                }
            };
            links.finish(&thread_id, &codespan, link);
        });
    }

    /// Write a finished resolution. Skipped when the key was dropped meanwhile.
    fn finish(&self, thread_id: &str, codespan: &str, link: Option<CodespanLocationLink>) {
        let key = (thread_id.to_owned(), codespan.to_owned());
        if !self.entries.borrow().contains_key(&key) {
            tracing::debug!(thread_id, codespan, "dropping link for forgotten thread");
            return;
        }
        self.add(thread_id, codespan, link);
    }

    /// Store a link (or the absence of one) and notify subscribers. Last write wins.
    pub fn add(&self, thread_id: &str, codespan: &str, link: Option<CodespanLocationLink>) {
        let entry = match link {
            Some(link) if link.is_usable() => Entry::Resolved(link),
            _ => Entry::NoLink,
        };
        self.entries.borrow_mut().insert((thread_id.to_owned(), codespan.to_owned()), entry);
        let _ = self.event_tx.send(LinkEvent {
            thread_id: thread_id.to_owned(),
            codespan: codespan.to_owned(),
        });
    }

    /// Drop every entry of a deleted thread.
    pub fn forget_thread(&self, thread_id: &str) {
        self.entries.borrow_mut().retain(|(thread, _), _| thread != thread_id);
    }

    pub fn pending_count(&self) -> usize {
        self.entries.borrow().values().filter(|entry| matches!(entry, Entry::Pending)).count()
    }
}
