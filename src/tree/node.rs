//! Tree nodes and the record metadata they carry.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::RwLock;

use crate::bib::BibEntry;

/// The resolved identity of one preprint.
///
/// `identifier` never changes once set, and a non-empty `bib_path`
/// points at a file that exists for the rest of the process's life
/// (extraction directories are never deleted by the crawl).
#[derive(Debug, Clone, Default)]
pub struct RecordInfo {
    /// Canonical archive identifier (trailing segment of the entry's
    /// `id` URL).
    pub identifier: String,
    pub author: String,
    pub title: String,
    /// Downloaded source tarball, empty before download.
    pub source_path: PathBuf,
    /// Extracted bibliography file, empty when none was found.
    pub bib_path: PathBuf,
    /// The bibliography entry this record was resolved from, if any.
    pub entry: Option<BibEntry>,
}

impl RecordInfo {
    #[must_use]
    pub fn has_bibliography(&self) -> bool {
        !self.bib_path.as_os_str().is_empty()
    }
}

/// One node of the citation tree.
///
/// Children are installed exactly once, by the parent's expansion, and
/// are read-only afterwards; the back-reference to the parent is weak
/// so ownership flows strictly root-down. Two nodes citing the same
/// work produce two independent subtrees; the tree is depth-bounded by
/// construction, so no cycle detection is needed.
#[derive(Debug)]
pub struct CiteNode {
    parent: Weak<CiteNode>,
    info: RwLock<RecordInfo>,
    children: OnceLock<Vec<Arc<CiteNode>>>,
}

impl CiteNode {
    /// A parentless node.
    #[must_use]
    pub fn root(info: RecordInfo) -> Arc<Self> {
        Arc::new(Self {
            parent: Weak::new(),
            info: RwLock::new(info),
            children: OnceLock::new(),
        })
    }

    /// A node whose back-reference points at `parent`. The caller still
    /// has to install it into the parent's children list.
    #[must_use]
    pub fn child_of(parent: &Arc<CiteNode>, info: RecordInfo) -> Arc<Self> {
        Arc::new(Self {
            parent: Arc::downgrade(parent),
            info: RwLock::new(info),
            children: OnceLock::new(),
        })
    }

    #[must_use]
    pub fn parent(&self) -> Option<Arc<CiteNode>> {
        self.parent.upgrade()
    }

    /// Snapshot of the node's record.
    #[must_use]
    pub fn info(&self) -> RecordInfo {
        self.info.read().clone()
    }

    /// Mutate the record in place. Used only while the node is being
    /// resolved; the record is frozen afterwards.
    pub fn update_info(&self, f: impl FnOnce(&mut RecordInfo)) {
        f(&mut self.info.write());
    }

    /// The node's children, empty until installed.
    #[must_use]
    pub fn children(&self) -> &[Arc<CiteNode>] {
        self.children.get().map(Vec::as_slice).unwrap_or_default()
    }

    /// Install the children list. Returns false when a list was already
    /// installed, in which case the existing list is untouched.
    pub fn install_children(&self, children: Vec<Arc<CiteNode>>) -> bool {
        self.children.set(children).is_ok()
    }
}
