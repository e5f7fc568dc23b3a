//! One full run: visit every batch in order, then compute unused artifacts.
use rayon::prelude::*;
use tracing::info;

use crate::error::{ModelXrefError, Result};
use crate::model::{Document, DocumentKind, Model};
use crate::report::{CrossReference, Unused, WidgetInstance};
use crate::sheet::Sheet;
use crate::store::{Partition, Store, UsageLog};
use crate::visit::{VisitContext, VisitOutput, visit_document};

#[derive(Clone, Debug, Default)]
pub struct RunConfig {
    /// Only documents whose qualified name starts with this are visited.
    pub module_prefix: String,
    /// Visit the documents of a batch on the rayon pool.
    pub parallel: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub pages: usize,
    pub fragments: usize,
    pub layouts: usize,
    pub flows: usize,
}

impl RunStats {
    fn count(&mut self, kind: DocumentKind) {
        match kind {
            DocumentKind::Page => self.pages += 1,
            DocumentKind::Fragment => self.fragments += 1,
            DocumentKind::Layout => self.layouts += 1,
            DocumentKind::Flow => self.flows += 1,
        }
    }
}

#[derive(Debug)]
pub struct RunOutput {
    pub overview: Sheet,
    pub flows: Sheet,
    pub cross_reference: CrossReference,
    pub stats: RunStats,
}

pub fn run(model: &Model, config: &RunConfig) -> Result<RunOutput> {
    let ctx = VisitContext::new(model, &config.module_prefix);
    let mut store = Store::new();
    let mut overview = Sheet::overview();
    let mut flows = Sheet::flows();
    let mut widgets: Vec<WidgetInstance> = Vec::new();
    let mut stats = RunStats::default();

    for kind in DocumentKind::BATCH_ORDER {
        let documents = model.documents(kind);
        info!(%kind, documents = documents.len(), "processing batch");

        let outputs = if config.parallel {
            visit_parallel(&documents, &ctx, &mut store)?
        } else {
            visit_sequential(&documents, &ctx, &mut store)?
        };

        let sheet = match kind {
            DocumentKind::Flow => &mut flows,
            _ => &mut overview,
        };
        for out in outputs {
            if out.visited {
                stats.count(kind);
            }
            sheet.extend(out.rows);
            widgets.extend(out.widgets);
        }
    }

    let unused = Unused {
        fragment: store.compute_unused(&model.declared(DocumentKind::Fragment), Partition::Fragment),
        layout: store.compute_unused(&model.declared(DocumentKind::Layout), Partition::Layout),
    };
    info!(
        unused_fragments = unused.fragment.len(),
        unused_layouts = unused.layout.len(),
        classes = store.class_names().len(),
        "cross-reference complete"
    );

    Ok(RunOutput {
        overview,
        flows,
        cross_reference: CrossReference::new(store, unused, widgets),
        stats,
    })
}

fn visit_sequential(documents: &[Document<'_>], ctx: &VisitContext, store: &mut Store) -> Result<Vec<VisitOutput>> {
    documents
        .iter()
        .map(|document| {
            visit_document(document, ctx, store)
                .map_err(|source| ModelXrefError::Decode { location: document.location(), source })
        })
        .collect()
}

/// Documents are visited concurrently against private usage logs; the logs
/// are replayed into the store in document order so the result matches a
/// sequential run.
fn visit_parallel(documents: &[Document<'_>], ctx: &VisitContext, store: &mut Store) -> Result<Vec<VisitOutput>> {
    let visited = documents
        .par_iter()
        .map(|document| {
            let mut log = UsageLog::new();
            let out = visit_document(document, ctx, &mut log)
                .map_err(|source| ModelXrefError::Decode { location: document.location(), source })?;
            Ok((out, log))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(visited
        .into_iter()
        .map(|(out, log)| {
            log.replay(store);
            out
        })
        .collect())
}
