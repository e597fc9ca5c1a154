//! Path selection.
//!
//! The engine picks the generic or legacy implementation once, from the
//! configured toolkit version, and forwards every request to it.

use std::fmt;
use std::sync::Arc;

use spmm_tensor::Element;

use crate::allocator::CachingAllocator;
use crate::config::{Capabilities, SpmmConfig};
use crate::error::Result;
use crate::generic::GenericSpmm;
use crate::host::HostSpmm;
use crate::legacy::LegacySpmm;
use crate::matmul::{MatmulRequest, SparseDenseMatmul};
use crate::primitive::SpmmPrimitive;
use crate::stream::Stream;

/// Which implementation an engine dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpmmPath {
    Generic,
    Legacy,
}

impl fmt::Display for SpmmPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpmmPath::Generic => write!(f, "generic"),
            SpmmPath::Legacy => write!(f, "legacy"),
        }
    }
}

#[derive(Debug)]
enum Backend<P> {
    Generic(GenericSpmm<P>),
    Legacy(LegacySpmm),
}

/// Sparse × dense multiply-accumulate engine with its own stream and
/// scratch allocator.
#[derive(Debug)]
pub struct SpmmEngine<P = HostSpmm> {
    config: SpmmConfig,
    caps: Capabilities,
    stream: Arc<Stream>,
    allocator: CachingAllocator,
    backend: Backend<P>,
}

impl SpmmEngine<HostSpmm> {
    /// Engine backed by the host reference primitive.
    pub fn new(config: SpmmConfig) -> Result<Self> {
        let primitive = HostSpmm::new(config.capabilities());
        Self::with_primitive(config, primitive)
    }
}

impl<P: SpmmPrimitive> SpmmEngine<P> {
    /// Engine backed by `primitive`. The primitive is unused when the
    /// toolkit lacks the generic API.
    pub fn with_primitive(config: SpmmConfig, primitive: P) -> Result<Self> {
        let caps = config.capabilities();
        let stream = Arc::new(Stream::new("default")?);
        let allocator = match config.scratch_limit {
            Some(limit) => CachingAllocator::with_limit(limit),
            None => CachingAllocator::new(),
        };

        let backend = if caps.generic_api {
            Backend::Generic(GenericSpmm::new(
                primitive,
                caps,
                config.algorithm(),
                Arc::clone(&stream),
                allocator.clone(),
            ))
        } else {
            log::warn!(
                "toolkit {} has no generic SpMM API, using the legacy column-major path",
                config.toolkit
            );
            Backend::Legacy(LegacySpmm::new(Arc::clone(&stream)))
        };

        let engine = SpmmEngine {
            config,
            caps,
            stream,
            allocator,
            backend,
        };
        log::debug!(
            "spmm engine: toolkit {} path {} caps {:?}",
            engine.config.toolkit,
            engine.path(),
            engine.caps
        );
        Ok(engine)
    }

    pub fn path(&self) -> SpmmPath {
        match self.backend {
            Backend::Generic(_) => SpmmPath::Generic,
            Backend::Legacy(_) => SpmmPath::Legacy,
        }
    }

    pub fn config(&self) -> &SpmmConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn allocator(&self) -> &CachingAllocator {
        &self.allocator
    }

    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    /// Wait for all enqueued work.
    pub fn synchronize(&self) -> Result<()> {
        self.stream.synchronize()
    }
}

impl<P: SpmmPrimitive> SparseDenseMatmul for SpmmEngine<P> {
    fn addmm<T: Element>(&self, request: MatmulRequest<'_, T>) -> Result<()> {
        match &self.backend {
            Backend::Generic(generic) => generic.addmm(request),
            Backend::Legacy(legacy) => legacy.addmm(request),
        }
    }
}
