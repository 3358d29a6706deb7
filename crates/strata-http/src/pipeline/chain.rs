//! Ordered, immutable list of stages shared read-only across requests

use std::fmt;
use std::sync::Arc;

use super::stage::Stage;

/// Ordered stages run in registration order inbound and reverse order outbound
#[derive(Clone)]
pub struct MiddlewareChain {
    stages: Arc<[Arc<dyn Stage>]>,
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MiddlewareChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self {
            stages: Arc::from(Vec::<Arc<dyn Stage>>::new()),
        }
    }

    /// Create a chain from already shared stages
    pub fn from_stages(stages: Vec<Arc<dyn Stage>>) -> Self {
        Self {
            stages: Arc::from(stages),
        }
    }

    /// Append a stage (builder style)
    pub fn with<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.push(stage);
        self
    }

    /// Append a stage
    pub fn push<S: Stage + 'static>(&mut self, stage: S) {
        self.push_shared(Arc::new(stage));
    }

    /// Append a stage that is also used elsewhere
    pub fn push_shared(&mut self, stage: Arc<dyn Stage>) {
        let mut stages = self.stages.to_vec();
        stages.push(stage);
        self.stages = Arc::from(stages);
    }

    /// New chain with this chain's stages followed by `other`'s
    pub fn extend(&self, other: &MiddlewareChain) -> Self {
        let stages: Vec<Arc<dyn Stage>> = self
            .stages
            .iter()
            .chain(other.stages.iter())
            .cloned()
            .collect();
        Self::from_stages(stages)
    }

    pub fn stages(&self) -> &[Arc<dyn Stage>] {
        &self.stages
    }

    /// Stage names in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("stages", &self.names())
            .finish()
    }
}
