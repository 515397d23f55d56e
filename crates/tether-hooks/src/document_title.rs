use std::cell::Cell;
use std::rc::Rc;

use tether_core::{Dispose, keyed_effect, remember_disposable};

use crate::host::{Document, environment};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DocumentTitleOptions {
    /// Leave the last title in place on teardown instead of restoring the
    /// one found on the first pass.
    pub preserve_title_on_unmount: bool,
}

impl Default for DocumentTitleOptions {
    fn default() -> Self {
        Self {
            preserve_title_on_unmount: true,
        }
    }
}

struct TitleState {
    document: Option<Rc<dyn Document>>,
    original: Option<String>,
    preserve: Cell<bool>,
}

pub fn use_document_title(title: &str, options: DocumentTitleOptions) {
    let state = remember_disposable(
        || {
            let document = environment().document;
            let original = document.as_ref().map(|d| d.title());
            TitleState {
                document,
                original,
                preserve: Cell::new(options.preserve_title_on_unmount),
            }
        },
        |state| {
            if state.preserve.get() {
                return;
            }
            if let (Some(doc), Some(original)) = (&state.document, &state.original) {
                doc.set_title(original);
            }
        },
    );
    state.preserve.set(options.preserve_title_on_unmount);

    let document = state.document.clone();
    keyed_effect(title.to_owned(), move |title| {
        if let Some(doc) = document {
            doc.set_title(title);
        }
        Dispose::noop()
    });
}
