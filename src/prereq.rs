//! Row prerequisites and the background pass that checks them.
//!
//! Documents are single-threaded, so the scanner works on an XML snapshot of the
//! sheet. Each request bumps a shared generation counter; results from an older
//! generation are thrown away, both on the worker (which stops early) and when
//! results are applied.

use crate::codec;
use crate::document::Document;
use crate::resolve::{AttributeSource, Resolver};
use crate::row::{Row, RowId};
use crate::skill_default::Attribute;
use crate::statics;
use crate::xml::{CodecError, Tag, XmlReader, XmlWriter};
use anyhow::Context;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrereqKind {
    Attribute(Attribute),
    Skill {
        name: String,
        specialization: String,
    },
}

/// "Requires X of at least N."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prereq {
    pub kind: PrereqKind,
    pub at_least: i32,
}

impl Prereq {
    pub fn attribute(attr: Attribute, at_least: i32) -> Self {
        Self {
            kind: PrereqKind::Attribute(attr),
            at_least,
        }
    }

    pub fn skill(name: &str, specialization: &str, at_least: i32) -> Self {
        Self {
            kind: PrereqKind::Skill {
                name: name.to_string(),
                specialization: specialization.to_string(),
            },
            at_least,
        }
    }

    /// `None` when met, otherwise what is missing.
    pub fn check<A: AttributeSource + ?Sized>(&self, resolver: &Resolver<'_, A>) -> Option<String> {
        match &self.kind {
            PrereqKind::Attribute(attr) => {
                let have = resolver.attributes().attribute(*attr);
                (have < self.at_least).then(|| format!("{attr} of at least {}", self.at_least))
            }
            PrereqKind::Skill {
                name,
                specialization,
            } => {
                let have = resolver.best_level_named(name, specialization);
                if have.is_some_and(|level| level >= self.at_least) {
                    return None;
                }
                let mut label = name.clone();
                if !specialization.is_empty() {
                    label.push_str(&format!(" ({specialization})"));
                }
                Some(format!("{label} at level {} or better", self.at_least))
            }
        }
    }

    pub(crate) fn load_list(reader: &mut XmlReader<'_>, tag: &Tag) -> Result<Vec<Self>, CodecError> {
        let mut list = Vec::new();
        if tag.empty {
            return Ok(list);
        }
        while let Some(child) = reader.next_child(&tag.name)? {
            let at_least = child.attr_i32("at_least").unwrap_or(0);
            match child.name.as_str() {
                statics::TAG_ATTRIBUTE_PREREQ => {
                    match child.attr("which").and_then(Attribute::from_key) {
                        Some(attr) => list.push(Prereq::attribute(attr, at_least)),
                        None => log::trace!("dropping attribute prereq without a known attribute"),
                    }
                }
                statics::TAG_SKILL_PREREQ => list.push(Prereq::skill(
                    child.attr("name").unwrap_or_default(),
                    child.attr("specialization").unwrap_or_default(),
                    at_least,
                )),
                other => log::trace!("skipping unknown prereq <{other}>"),
            }
            reader.skip(&child)?;
        }
        Ok(list)
    }

    pub(crate) fn save_list(out: &mut XmlWriter, list: &[Self]) {
        if list.is_empty() {
            return;
        }
        out.start_tag(statics::TAG_PREREQS, &[]);
        for prereq in list {
            let at_least = ("at_least", prereq.at_least.to_string());
            match &prereq.kind {
                PrereqKind::Attribute(attr) => out.empty_tag(
                    statics::TAG_ATTRIBUTE_PREREQ,
                    &[("which", attr.key().to_string()), at_least],
                ),
                PrereqKind::Skill {
                    name,
                    specialization,
                } => {
                    let mut attrs = vec![("name", name.clone())];
                    if !specialization.is_empty() {
                        attrs.push(("specialization", specialization.clone()));
                    }
                    attrs.push(at_least);
                    out.empty_tag(statics::TAG_SKILL_PREREQ, &attrs);
                }
            }
        }
        out.end_tag(statics::TAG_PREREQS);
    }
}

/// Satisfaction of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrereqResult {
    pub row: RowId,
    pub satisfied: bool,
    pub reason: String,
}

/// Checks every prerequisite of `row`.
pub fn evaluate<A: AttributeSource + ?Sized>(row: &Row, resolver: &Resolver<'_, A>) -> PrereqResult {
    let missing: Vec<String> = row.prereqs().iter().filter_map(|p| p.check(resolver)).collect();
    PrereqResult {
        row: row.id(),
        satisfied: missing.is_empty(),
        reason: if missing.is_empty() {
            String::new()
        } else {
            format!("{}{}", statics::EN_UNSATISFIED_PREFIX, missing.join("; "))
        },
    }
}

struct Job {
    generation: u64,
    snapshot: String,
}

struct Outcome {
    generation: u64,
    results: Vec<PrereqResult>,
}

/// Recomputes row satisfaction off the owner thread.
pub struct PrereqScanner {
    jobs: Option<Sender<Job>>,
    outcomes: Receiver<Outcome>,
    latest: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl PrereqScanner {
    pub fn spawn() -> anyhow::Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (out_tx, out_rx) = mpsc::channel::<Outcome>();
        let latest = Arc::new(AtomicU64::new(0));
        let worker_latest = latest.clone();
        let worker = thread::Builder::new()
            .name("prereq-scanner".to_string())
            .spawn(move || run_worker(job_rx, out_tx, worker_latest))
            .context("spawning prerequisite scanner")?;
        Ok(Self {
            jobs: Some(job_tx),
            outcomes: out_rx,
            latest,
            worker: Some(worker),
        })
    }

    /// Queues a pass over the current state of `doc`, superseding any pass in flight.
    pub fn request(&self, doc: &Document) -> u64 {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = codec::write_document(doc, statics::NL_LF);
        let sent = match &self.jobs {
            Some(jobs) => jobs.send(Job { generation, snapshot }).is_ok(),
            None => false,
        };
        if !sent {
            log::error!("prerequisite scanner has stopped; request {generation} dropped");
        }
        generation
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Applies a finished current pass if one is waiting. Never blocks.
    pub fn poll(&self, doc: &mut Document) -> bool {
        let mut applied = false;
        while let Ok(outcome) = self.outcomes.try_recv() {
            applied |= self.apply(doc, outcome);
        }
        applied
    }

    /// Blocks until the current pass has been applied or `timeout` runs out.
    pub fn wait(&self, doc: &mut Document, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.outcomes.recv_timeout(remaining) {
                Ok(outcome) => {
                    if self.apply(doc, outcome) {
                        return true;
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return false,
            }
        }
    }

    fn apply(&self, doc: &mut Document, outcome: Outcome) -> bool {
        if outcome.generation != self.latest_generation() {
            log::debug!("discarding superseded prerequisite pass {}", outcome.generation);
            return false;
        }
        for result in outcome.results {
            if let Some(row) = doc.find_mut(result.row) {
                row.set_satisfied(result.satisfied, &result.reason);
            }
        }
        true
    }
}

impl Drop for PrereqScanner {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop.
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("prerequisite scanner panicked");
            }
        }
    }
}

fn run_worker(jobs: Receiver<Job>, outcomes: Sender<Outcome>, latest: Arc<AtomicU64>) {
    let current = |generation: u64| latest.load(Ordering::SeqCst) == generation;
    for job in jobs {
        if !current(job.generation) {
            continue;
        }
        let doc = match codec::read_document(job.snapshot.as_bytes()) {
            Ok(doc) => doc,
            Err(err) => {
                log::error!("prerequisite snapshot {} unreadable: {err}", job.generation);
                continue;
            }
        };
        let resolver = Resolver::new(doc.rows(), doc.attributes());
        let mut results = Vec::new();
        let mut superseded = false;
        for row in doc.iter() {
            if !current(job.generation) {
                superseded = true;
                break;
            }
            results.push(evaluate(row, &resolver));
        }
        if superseded {
            log::debug!("prerequisite pass {} superseded", job.generation);
            continue;
        }
        if outcomes
            .send(Outcome {
                generation: job.generation,
                results,
            })
            .is_err()
        {
            break;
        }
    }
}
