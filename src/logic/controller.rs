use serde::Serialize;

use crate::logic::database::{build_database, parse_database};
use crate::logic::validate::{check_reference_name, ValidationIssue};
use crate::logic::vector_store::{build_vector_store, infer_mode, parse_vector_store};
use crate::model::{DatabaseForm, Document, EditSession, Entry, EntryKey, VectorStoreForm};

/// What a mutation did to the document
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Applied,
    /// Nothing was written
    Rejected(ValidationIssue),
    Unchanged,
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DocumentEvent {
    Upserted { entry: EntryKey },
    Removed { entry: EntryKey },
    Renamed { from: EntryKey, to: EntryKey },
}

type Subscriber = Box<dyn FnMut(&DocumentEvent, &Document) + Send>;

/// Owns the document being edited and serializes every mutation through itself.
///
/// Subscribers see each change after it has been applied, together with the
/// resulting document.
pub struct DocumentController {
    document: Document,
    session: EditSession,
    subscribers: Vec<Subscriber>,
}

impl DocumentController {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            session: EditSession::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(&DocumentEvent, &Document) + Send + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Insert or replace an entry. `editing` is the key the entry was loaded
    /// under, if any; saving under a new key renames it.
    pub fn upsert(&mut self, key: &str, entry: Entry, editing: Option<&str>) -> MutationOutcome {
        let namespace = entry.namespace();
        let target = EntryKey::new(namespace, key);
        let own = editing.map(|previous| EntryKey::new(namespace, previous));
        if let Some(issue) = check_reference_name(key, &self.document, namespace, own.as_ref()) {
            log::info!("rejected save of {}: {}", target, issue);
            return MutationOutcome::Rejected(issue);
        }

        let renamed = editing.filter(|previous| *previous != key);
        if let Some(previous) = renamed {
            let from = EntryKey::new(namespace, previous);
            self.document.remove_entry(&from);
            self.session.rename(&from, key);
        }

        let previous = self.document.insert_entry(key.to_string(), entry.clone());
        if renamed.is_none() && previous.as_ref() == Some(&entry) {
            return MutationOutcome::Unchanged;
        }

        log::debug!("saved {}", target);
        let event = match renamed {
            Some(previous) => DocumentEvent::Renamed {
                from: EntryKey::new(namespace, previous),
                to: target,
            },
            None => DocumentEvent::Upserted { entry: target },
        };
        self.notify(&event);
        MutationOutcome::Applied
    }

    /// Delete an entry. References to it elsewhere are not touched.
    pub fn remove(&mut self, entry: &EntryKey) -> MutationOutcome {
        if self.document.remove_entry(entry).is_none() {
            return MutationOutcome::Unchanged;
        }
        self.session.forget(entry);
        log::debug!("removed {}", entry);
        self.notify(&DocumentEvent::Removed {
            entry: entry.clone(),
        });
        MutationOutcome::Applied
    }

    /// Move an entry to a new key within its namespace
    pub fn rename(&mut self, from: &EntryKey, to: &str) -> MutationOutcome {
        if from.key == to {
            return MutationOutcome::Unchanged;
        }
        let issue = check_reference_name(to, &self.document, from.namespace, Some(from));
        if let Some(issue) = issue {
            return MutationOutcome::Rejected(issue);
        }
        let Some(entry) = self.document.remove_entry(from) else {
            return MutationOutcome::Unchanged;
        };
        self.document.insert_entry(to.to_string(), entry);
        self.session.rename(from, to);
        self.notify(&DocumentEvent::Renamed {
            from: from.clone(),
            to: EntryKey::new(from.namespace, to),
        });
        MutationOutcome::Applied
    }

    /// Edit form for a stored database, using the remembered subtype as tiebreak
    pub fn edit_database(&self, key: &str) -> Option<DatabaseForm> {
        let record = self.document.resources.databases.get(key)?;
        Some(parse_database(
            record,
            self.session.database_subtype(key),
            &self.document,
        ))
    }

    pub fn save_database(
        &mut self,
        key: &str,
        form: &DatabaseForm,
        editing: Option<&str>,
    ) -> MutationOutcome {
        let record = build_database(form);
        let outcome = self.upsert(key, Entry::Database(record), editing);
        if !matches!(outcome, MutationOutcome::Rejected(_)) {
            self.session
                .remember_database_subtype(key, form.selected_subtype());
        }
        outcome
    }

    pub fn edit_vector_store(&self, key: &str) -> Option<VectorStoreForm> {
        let record = self.document.resources.vector_stores.get(key)?;
        Some(parse_vector_store(
            record,
            self.session.vector_store_mode(key),
            &self.document,
        ))
    }

    pub fn save_vector_store(
        &mut self,
        key: &str,
        form: &VectorStoreForm,
        editing: Option<&str>,
    ) -> MutationOutcome {
        let record = build_vector_store(form);
        let mode = infer_mode(&record, Some(form.config_mode));
        let outcome = self.upsert(key, Entry::VectorStore(record), editing);
        if !matches!(outcome, MutationOutcome::Rejected(_)) {
            self.session.remember_vector_store_mode(key, mode);
        }
        outcome
    }

    fn notify(&mut self, event: &DocumentEvent) {
        for subscriber in self.subscribers.iter_mut() {
            subscriber(event, &self.document);
        }
    }
}

impl Default for DocumentController {
    fn default() -> Self {
        Self::new(Document::default())
    }
}

impl std::fmt::Debug for DocumentController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentController")
            .field("document", &self.document)
            .field("session", &self.session)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
