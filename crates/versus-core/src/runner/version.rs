//! Candidate implementations under comparison
//!
//! A version is an opaque callable. Whether it wraps a local function or a
//! proxy to remote execution is of no concern to the scheduler.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use super::cell::CellError;
use crate::error::{VersionError, panic_message};
use crate::samples::{NamedArgs, Sample};

/// Synchronous version callable
pub type SyncVersionFn = dyn Fn(&[Value], &NamedArgs) -> Result<Value, VersionError> + Send + Sync;

/// Asynchronous version callable
pub type AsyncVersionFn =
    dyn Fn(Vec<Value>, NamedArgs) -> BoxFuture<'static, Result<Value, VersionError>> + Send + Sync;

/// The callable behind a version
#[derive(Clone)]
pub enum VersionFn {
    Sync(Arc<SyncVersionFn>),
    Async(Arc<AsyncVersionFn>),
}

/// A named candidate implementation
#[derive(Clone)]
pub struct VersionHandle {
    /// The callable's own name
    name: Option<String>,
    /// Explicit version identifier, preferred over the name
    version: Option<String>,
    func: VersionFn,
}

impl VersionHandle {
    /// Wrap a synchronous callable
    pub fn sync<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value], &NamedArgs) -> Result<Value, VersionError> + Send + Sync + 'static,
    {
        Self {
            name: Some(name.into()),
            version: None,
            func: VersionFn::Sync(Arc::new(f)),
        }
    }

    /// Wrap an asynchronous callable
    pub fn new_async<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Vec<Value>, NamedArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, VersionError>> + Send + 'static,
    {
        Self {
            name: Some(name.into()),
            version: None,
            func: VersionFn::Async(Arc::new(move |args, kwargs| f(args, kwargs).boxed())),
        }
    }

    /// Wrap an existing callable without a name
    pub fn anonymous(func: VersionFn) -> Self {
        Self {
            name: None,
            version: None,
            func,
        }
    }

    /// Attach an explicit version identifier
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn is_async(&self) -> bool {
        matches!(self.func, VersionFn::Async(_))
    }

    /// Base display name before disambiguation
    pub fn base_name(&self, index: usize) -> String {
        self.version
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| format!("version_{}", index))
    }

    /// Invoke a synchronous callable on the current thread
    pub fn invoke_blocking(&self, sample: &Sample) -> Result<Value, CellError> {
        match &self.func {
            VersionFn::Sync(f) => {
                match catch_unwind(AssertUnwindSafe(|| f(&sample.args, &sample.kwargs))) {
                    Ok(result) => result.map_err(|e| CellError::function(e.message)),
                    Err(payload) => Err(CellError::function(panic_message(payload.as_ref()))),
                }
            }
            VersionFn::Async(_) => Err(CellError::infrastructure(
                "asynchronous version scheduled on a synchronous worker",
            )),
        }
    }

    /// Invoke, awaiting asynchronous callables.
    ///
    /// Synchronous callables run inline; callers on a cooperative scheduler
    /// should offload them instead.
    pub async fn invoke(&self, sample: &Sample) -> Result<Value, CellError> {
        match &self.func {
            VersionFn::Sync(_) => self.invoke_blocking(sample),
            VersionFn::Async(f) => {
                let args = sample.args.clone();
                let kwargs = sample.kwargs.clone();
                let future = match catch_unwind(AssertUnwindSafe(|| f(args, kwargs))) {
                    Ok(future) => future,
                    Err(payload) => return Err(CellError::function(panic_message(payload.as_ref()))),
                };
                match AssertUnwindSafe(future).catch_unwind().await {
                    Ok(result) => result.map_err(|e| CellError::function(e.message)),
                    Err(payload) => Err(CellError::function(panic_message(payload.as_ref()))),
                }
            }
        }
    }
}

impl fmt::Debug for VersionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionHandle")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("is_async", &self.is_async())
            .finish()
    }
}

/// Resolve unique display names for the versions of one run.
///
/// A base name shared by several versions becomes `<base> (<k>)`, `k`
/// counting up from 1 in argument order. A `k` whose name another version
/// already carries is skipped, so every resolved name is distinct.
pub fn resolve_version_names(versions: &[VersionHandle]) -> Vec<String> {
    let bases: Vec<String> = versions
        .iter()
        .enumerate()
        .map(|(i, v)| v.base_name(i))
        .collect();

    let mut totals: HashMap<&str, usize> = HashMap::new();
    for base in &bases {
        *totals.entry(base.as_str()).or_insert(0) += 1;
    }

    let mut taken: HashSet<String> = bases
        .iter()
        .filter(|base| totals[base.as_str()] == 1)
        .cloned()
        .collect();
    let mut next_rank: HashMap<&str, usize> = HashMap::new();
    bases
        .iter()
        .map(|base| {
            if totals[base.as_str()] == 1 {
                return base.clone();
            }
            let rank = next_rank.entry(base.as_str()).or_insert(0);
            loop {
                *rank += 1;
                let candidate = format!("{} ({})", base, rank);
                if taken.insert(candidate.clone()) {
                    return candidate;
                }
            }
        })
        .collect()
}
