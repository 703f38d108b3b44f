use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::debug;

use crate::nutrition::NutritionSource;
use crate::sources::{FoodSource, SourceMatch};

/// One attempt in a fallback chain: ask `source` for `query`, accept the
/// answer only at or above `min_confidence`.
#[derive(Clone)]
pub struct FallbackStep {
    pub source: Arc<dyn FoodSource>,
    pub query: String,
    pub min_confidence: f64,
}

/// Ordered list of lookups, evaluated until one returns a confident match.
#[derive(Clone, Default)]
pub struct FallbackChain {
    steps: Vec<FallbackStep>,
}

impl FallbackChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, source: &Arc<dyn FoodSource>, query: impl Into<String>, min_confidence: f64) -> Self {
        self.steps.push(FallbackStep {
            source: source.clone(),
            query: query.into(),
            min_confidence,
        });
        self
    }

    pub fn followed_by(mut self, other: FallbackChain) -> Self {
        self.steps.extend(other.steps);
        self
    }

    pub fn steps(&self) -> &[FallbackStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// A (source, query) pair repeated later in the chain reuses the first
    /// answer instead of calling the source again.
    pub async fn run(&self) -> Option<SourceMatch> {
        let mut asked: HashMap<(NutritionSource, &str), Option<SourceMatch>> = HashMap::new();
        for step in &self.steps {
            let key = (step.source.kind(), step.query.as_str());
            let answer = match asked.get(&key).cloned() {
                Some(prior) => prior,
                None => {
                    let found = step.source.search(&step.query).await;
                    asked.insert(key, found.clone());
                    found
                }
            };
            match answer {
                Some(m) if m.confidence >= step.min_confidence => return Some(m),
                Some(m) => debug!(
                    source = step.source.kind().as_str(),
                    query = %step.query,
                    confidence = m.confidence,
                    required = step.min_confidence,
                    "match below threshold"
                ),
                None => debug!(source = step.source.kind().as_str(), query = %step.query, "no match"),
            }
        }
        None
    }
}

/// Runs many chains level by level: at each level the pending queries are
/// grouped per source and sent through that source's batch call, with the
/// different sources queried concurrently. Pairs already asked at an earlier
/// level are answered from memory.
pub async fn run_batched(chains: &[FallbackChain]) -> Vec<Option<SourceMatch>> {
    let mut results: Vec<Option<SourceMatch>> = vec![None; chains.len()];
    let mut answered: HashMap<(NutritionSource, String), Option<SourceMatch>> = HashMap::new();
    let depth = chains.iter().map(|c| c.steps.len()).max().unwrap_or(0);

    for level in 0..depth {
        let mut pending: Vec<(usize, &FallbackStep)> = Vec::new();
        let mut groups: HashMap<NutritionSource, (Arc<dyn FoodSource>, Vec<String>)> = HashMap::new();
        for (i, chain) in chains.iter().enumerate() {
            if results[i].is_some() {
                continue;
            }
            let Some(step) = chain.steps.get(level) else {
                continue;
            };
            let kind = step.source.kind();
            if !answered.contains_key(&(kind, step.query.clone())) {
                let (_, queries) = groups
                    .entry(kind)
                    .or_insert_with(|| (step.source.clone(), Vec::new()));
                if !queries.contains(&step.query) {
                    queries.push(step.query.clone());
                }
            }
            pending.push((i, step));
        }
        if pending.is_empty() {
            break;
        }

        let lookups: Vec<_> = groups
            .into_values()
            .map(|(source, queries)| async move {
                let found = source.batch_search(&queries).await;
                (source.kind(), queries, found)
            })
            .collect();
        for (kind, queries, mut found) in join_all(lookups).await {
            for q in queries {
                let m = found.remove(&q);
                answered.insert((kind, q), m);
            }
        }

        for (i, step) in pending {
            if let Some(Some(m)) = answered.get(&(step.source.kind(), step.query.clone())) {
                if m.confidence >= step.min_confidence {
                    results[i] = Some(m.clone());
                }
            }
        }
    }
    results
}
