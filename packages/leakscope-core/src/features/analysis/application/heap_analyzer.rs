//! Heap Analyzer - sequences one analysis run
//!
//! ```text
//! metadata ─► leaking ids ─► BFS (+ dominator edges) ─► dedup
//!          ─► inspect ─► resolve statuses ─► retained sizes
//!          ─► leak traces ─► groups
//! ```
//!
//! Every phase polls the cancellation token on entry; BFS and inspection also
//! poll while they run.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AnalysisConfig;
use crate::errors::{AnalysisError, Result};
use crate::features::analysis::domain::{
    ApplicationLeak, HeapAnalysis, HeapAnalysisFailure, HeapAnalysisSuccess, LeakTrace,
    LeakTraceObject, LeakTraceObjectType, LeakTraceReference, LibraryLeak,
};
use crate::features::analysis::ports::{
    AnalysisProgressListener, AnalysisStep, CancellationToken, LeakingObjectFinder,
    MetadataExtractor, NoOpMetadataExtractor, NoOpProgressListener,
};
use crate::features::dominators::{
    DominatorTree, NativeSizeMapper, RetainedSize, ShallowSizeCalculator, TotalSizeCalculator,
};
use crate::features::heap_graph::{load_snapshot, HeapGraph, ObjectId};
use crate::features::leak_status::{
    compute_leak_statuses, default_object_inspectors, find_keyed_weak_references,
    resolve_unreachable_status, LeakingStatus, ObjectInspector, ObjectReporter,
};
use crate::features::path_finding::{deduplicate_shortest_paths, PathFinder, ShortestPath};
use crate::features::reference_reader::{ReferenceMatcher, ReferenceMatchers};

use super::leak_grouper::LeakGrouper;

pub const RETAINED_YET_CLEARED_KEY: &str = "Count of retained yet cleared";

/// Everything a successful run produces
struct AnalysisOutput {
    metadata: Vec<(String, String)>,
    application_leaks: Vec<ApplicationLeak>,
    library_leaks: Vec<LibraryLeak>,
    unreachable_objects: Vec<LeakTraceObject>,
}

/// A deduplicated path with the resolved evidence of each object on it
struct ResolvedPath {
    path: ShortestPath,
    reporters: Vec<ObjectReporter>,
    statuses: Vec<(LeakingStatus, String)>,
}

/// Finds leaks in one heap graph
///
/// ## Example
/// ```rust,ignore
/// let analyzer = HeapAnalyzer::new(AnalysisConfig::preset(Preset::Balanced))
///     .with_listener(TracingProgressListener)
///     .with_object_inspector(MyInspector);
///
/// let analysis = analyzer.analyze(path, &graph, &KeyedWeakReferenceFinder);
/// ```
pub struct HeapAnalyzer {
    config: AnalysisConfig,
    listener: Box<dyn AnalysisProgressListener>,
    /// Registered before the built-in tables, so they take precedence
    reference_matchers: Vec<ReferenceMatcher>,
    inspectors: Vec<Box<dyn ObjectInspector>>,
    metadata_extractor: Box<dyn MetadataExtractor>,
    cancellation: CancellationToken,
}

impl HeapAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            listener: Box::new(NoOpProgressListener),
            reference_matchers: Vec::new(),
            inspectors: Vec::new(),
            metadata_extractor: Box::new(NoOpMetadataExtractor),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_listener(mut self, listener: impl AnalysisProgressListener + 'static) -> Self {
        self.listener = Box::new(listener);
        self
    }

    pub fn with_reference_matchers(mut self, matchers: impl IntoIterator<Item = ReferenceMatcher>) -> Self {
        self.reference_matchers.extend(matchers);
        self
    }

    /// Add an inspector; runs after the default inspectors, in registration order
    pub fn with_object_inspector(mut self, inspector: impl ObjectInspector + 'static) -> Self {
        self.inspectors.push(Box::new(inspector));
        self
    }

    pub fn with_metadata_extractor(mut self, extractor: impl MetadataExtractor + 'static) -> Self {
        self.metadata_extractor = Box::new(extractor);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze an already opened heap graph
    ///
    /// Never fails: errors and cancellation are reported as
    /// [`HeapAnalysis::Failure`].
    pub fn analyze(
        &self,
        heap_dump_file: &Path,
        graph: &dyn HeapGraph,
        finder: &dyn LeakingObjectFinder,
    ) -> HeapAnalysis {
        let started = Instant::now();
        let created_at = Utc::now();
        let result = self.run(graph, finder);
        self.finish(heap_dump_file, created_at, started, result)
    }

    /// Load a JSON heap snapshot and analyze it
    pub fn analyze_snapshot_file(&self, heap_dump_file: &Path, finder: &dyn LeakingObjectFinder) -> HeapAnalysis {
        let started = Instant::now();
        let created_at = Utc::now();
        let result = load_snapshot(heap_dump_file)
            .map_err(AnalysisError::from)
            .and_then(|graph| self.run(&graph, finder));
        self.finish(heap_dump_file, created_at, started, result)
    }

    fn finish(
        &self,
        heap_dump_file: &Path,
        created_at: DateTime<Utc>,
        started: Instant,
        result: Result<AnalysisOutput>,
    ) -> HeapAnalysis {
        let analysis_id = Uuid::new_v4();
        let analysis_duration_millis = started.elapsed().as_millis() as u64;
        match result {
            Ok(output) => {
                info!(
                    %analysis_id,
                    application_leaks = output.application_leaks.len(),
                    library_leaks = output.library_leaks.len(),
                    unreachable = output.unreachable_objects.len(),
                    duration_ms = analysis_duration_millis,
                    "Heap analysis done"
                );
                HeapAnalysis::Success(HeapAnalysisSuccess {
                    analysis_id,
                    heap_dump_file: heap_dump_file.to_path_buf(),
                    created_at,
                    analysis_duration_millis,
                    metadata: output.metadata,
                    application_leaks: output.application_leaks,
                    library_leaks: output.library_leaks,
                    unreachable_objects: output.unreachable_objects,
                })
            }
            Err(error) => {
                warn!(%analysis_id, error = %error, duration_ms = analysis_duration_millis, "Heap analysis failed");
                HeapAnalysis::Failure(HeapAnalysisFailure {
                    analysis_id,
                    heap_dump_file: heap_dump_file.to_path_buf(),
                    created_at,
                    analysis_duration_millis,
                    error_message: error.to_string(),
                    canceled: error.is_canceled(),
                    error: Some(Arc::new(error)),
                })
            }
        }
    }

    /// Poll cancellation, then announce the step
    fn enter(&self, step: AnalysisStep) -> Result<()> {
        if self.cancellation.is_canceled() {
            return Err(AnalysisError::Canceled { step });
        }
        self.listener.on_analysis_progress(step);
        Ok(())
    }

    fn run(&self, graph: &dyn HeapGraph, finder: &dyn LeakingObjectFinder) -> Result<AnalysisOutput> {
        self.config.validate()?;

        self.enter(AnalysisStep::ExtractingMetadata)?;
        let metadata = self.extract_metadata(graph)?;

        self.enter(AnalysisStep::FindingRetainedObjects)?;
        let mut leaking_object_ids = FxHashSet::default();
        for object_id in finder.find_leaking_object_ids(graph)? {
            if graph.object_exists(object_id)? {
                leaking_object_ids.insert(object_id);
            } else {
                warn!(object_id, "Leaking object does not exist in the heap, skipping");
            }
        }
        debug!(count = leaking_object_ids.len(), "Found leaking objects");

        self.enter(AnalysisStep::FindingPathsToRetainedObjects)?;
        let mut matchers = self.reference_matchers.clone();
        matchers.extend(self.config.reference_matchers.matchers());
        let mut path_finder = PathFinder::new(graph, Arc::new(ReferenceMatchers::new(&matchers)))?
            .with_cancellation(self.cancellation.clone(), self.config.cancellation_check_interval);
        let results = path_finder
            .find_paths_from_gc_roots(&leaking_object_ids, self.config.compute_retained_heap_size)?;

        let shortest_paths = results.shortest_paths();
        let reached: FxHashSet<ObjectId> = shortest_paths.iter().map(ShortestPath::leaking_object_id).collect();
        let mut unreachable_ids: Vec<ObjectId> = leaking_object_ids
            .iter()
            .filter(|id| !reached.contains(id))
            .copied()
            .collect();
        unreachable_ids.sort_unstable();

        let dominator_tree = results.dominator_tree;
        if let Some(tree) = &dominator_tree {
            self.enter(AnalysisStep::FindingDominators)?;
            let stats = tree.stats();
            debug!(
                nodes = stats.node_count,
                edges = stats.edge_count,
                iterations = stats.iterations,
                "Dominator tree ready"
            );
        }

        let path_count = shortest_paths.len();
        let deduplicated = deduplicate_shortest_paths(shortest_paths);
        debug!(before = path_count, after = deduplicated.len(), "Deduplicated shortest paths");

        self.enter(AnalysisStep::InspectingObjects)?;
        let default_inspectors = if self.config.default_inspectors {
            default_object_inspectors()
        } else {
            Vec::new()
        };
        let inspectors: Vec<&dyn ObjectInspector> = default_inspectors
            .iter()
            .chain(self.inspectors.iter())
            .map(|inspector| &**inspector)
            .collect();
        let mut inspection = Inspection::new(graph, &inspectors, &self.cancellation);

        let mut resolved_paths = Vec::with_capacity(deduplicated.len());
        for path in deduplicated {
            let mut reporters = path
                .object_ids()
                .into_iter()
                .map(|id| inspection.reporter(id))
                .collect::<Result<Vec<_>>>()?;
            add_library_leak_labels(&path, &mut reporters);
            let statuses = compute_leak_statuses(&reporters)?;
            resolved_paths.push(ResolvedPath {
                path,
                reporters,
                statuses,
            });
        }

        let mut unreachable = Vec::with_capacity(unreachable_ids.len());
        for id in &unreachable_ids {
            let reporter = inspection.reporter(*id)?;
            let status = resolve_unreachable_status(&reporter);
            unreachable.push((reporter, status));
        }
        debug!(inspected = inspection.len(), "Inspected objects");

        let retained_sizes = match &dominator_tree {
            Some(tree) => self.compute_retained_sizes(graph, tree, &resolved_paths)?,
            None => FxHashMap::default(),
        };

        self.enter(AnalysisStep::BuildingLeakTraces)?;
        let mut grouper = LeakGrouper::new();
        for resolved in &resolved_paths {
            let trace = build_leak_trace(resolved, &retained_sizes);
            grouper.add(trace, resolved.path.first_library_leak());
        }
        let (application_leaks, library_leaks) = grouper.finish();

        let unreachable_objects = unreachable
            .iter()
            .map(|(reporter, (status, reason))| leak_trace_object(reporter, *status, reason.clone(), None))
            .collect();

        Ok(AnalysisOutput {
            metadata,
            application_leaks,
            library_leaks,
            unreachable_objects,
        })
    }

    fn extract_metadata(&self, graph: &dyn HeapGraph) -> Result<Vec<(String, String)>> {
        let mut metadata = self.metadata_extractor.extract_metadata(graph)?;
        let cleared = find_keyed_weak_references(graph)?
            .iter()
            .filter(|mirror| mirror.is_retained() && !mirror.has_referent())
            .count();
        if cleared > 0 {
            metadata.push((
                RETAINED_YET_CLEARED_KEY.to_string(),
                format!("{} KeyedWeakReference instances", cleared),
            ));
        }
        Ok(metadata)
    }

    /// Sizes of every LEAKING or UNKNOWN object on a path
    fn compute_retained_sizes(
        &self,
        graph: &dyn HeapGraph,
        tree: &DominatorTree,
        resolved_paths: &[ResolvedPath],
    ) -> Result<FxHashMap<ObjectId, RetainedSize>> {
        let native_sizes = if self.config.compute_native_sizes {
            self.enter(AnalysisStep::ComputingNativeRetainedSize)?;
            NativeSizeMapper::map_native_sizes(graph)?
        } else {
            FxHashMap::default()
        };

        self.enter(AnalysisStep::ComputingRetainedSize)?;
        let ids: FxHashSet<ObjectId> = resolved_paths
            .iter()
            .flat_map(|resolved| resolved.reporters.iter().zip(&resolved.statuses))
            .filter(|(_, (status, _))| *status != LeakingStatus::NotLeaking)
            .map(|(reporter, _)| reporter.object_id())
            .collect();
        let mut sizes = TotalSizeCalculator::new(ShallowSizeCalculator::new(), native_sizes);
        Ok(tree.compute_retained_sizes(graph, &ids, &mut sizes)?)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Inspection
// ═══════════════════════════════════════════════════════════════════════════

/// Runs the inspector chain at most once per object
struct Inspection<'a> {
    graph: &'a dyn HeapGraph,
    inspectors: &'a [&'a dyn ObjectInspector],
    cancellation: &'a CancellationToken,
    inspected: FxHashMap<ObjectId, ObjectReporter>,
}

impl<'a> Inspection<'a> {
    fn new(
        graph: &'a dyn HeapGraph,
        inspectors: &'a [&'a dyn ObjectInspector],
        cancellation: &'a CancellationToken,
    ) -> Self {
        Self {
            graph,
            inspectors,
            cancellation,
            inspected: FxHashMap::default(),
        }
    }

    fn len(&self) -> usize {
        self.inspected.len()
    }

    /// A copy of the evidence for `object_id`; path labels are added per copy
    fn reporter(&mut self, object_id: ObjectId) -> Result<ObjectReporter> {
        if let Some(reporter) = self.inspected.get(&object_id) {
            return Ok(reporter.clone());
        }
        if self.cancellation.is_canceled() {
            return Err(AnalysisError::Canceled {
                step: AnalysisStep::InspectingObjects,
            });
        }
        let object = self.graph.find_object_by_id(object_id)?.ok_or_else(|| {
            AnalysisError::invalid_state(format!("object {} does not exist", object_id))
        })?;
        let mut reporter = ObjectReporter::new(object.into_owned());
        for inspector in self.inspectors {
            if let Err(error) = inspector.inspect(self.graph, &mut reporter) {
                warn!(inspector = inspector.name(), object_id, error = %error, "Object inspector failed");
                return Err(error);
            }
        }
        self.inspected.insert(object_id, reporter.clone());
        Ok(reporter)
    }
}

/// Label the origin of every library-leak reference on the path
fn add_library_leak_labels(path: &ShortestPath, reporters: &mut [ObjectReporter]) {
    if let Some(matcher) = &path.root.library_leak {
        reporters[0].add_label(format!("Library leak match: {}", matcher.pattern));
    }
    for (index, child) in path.children.iter().enumerate() {
        if let Some(matcher) = &child.reference.matched_library_leak {
            reporters[index].add_label(format!("Library leak match: {}", matcher.pattern));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Leak traces
// ═══════════════════════════════════════════════════════════════════════════

fn leak_trace_object(
    reporter: &ObjectReporter,
    leaking_status: LeakingStatus,
    leaking_status_reason: String,
    retained: Option<RetainedSize>,
) -> LeakTraceObject {
    let object = reporter.heap_object();
    LeakTraceObject {
        object_id: reporter.object_id(),
        object_type: LeakTraceObjectType::of(object),
        class_name: object.class_name().to_string(),
        labels: reporter.labels().to_vec(),
        leaking_status,
        leaking_status_reason,
        retained_heap_byte_size: retained.map(|size| size.byte_size),
        retained_object_count: retained.map(|size| size.object_count),
    }
}

fn build_leak_trace(resolved: &ResolvedPath, retained_sizes: &FxHashMap<ObjectId, RetainedSize>) -> LeakTrace {
    let mut objects: Vec<LeakTraceObject> = resolved
        .reporters
        .iter()
        .zip(&resolved.statuses)
        .map(|(reporter, (status, reason))| {
            let retained = match status {
                LeakingStatus::NotLeaking => None,
                _ => retained_sizes.get(&reporter.object_id()).copied(),
            };
            leak_trace_object(reporter, *status, reason.clone(), retained)
        })
        .collect();

    // Paths always hold at least their root
    let leaking_object = objects.pop().unwrap_or_else(|| {
        leak_trace_object(&resolved.reporters[0], LeakingStatus::Leaking, String::new(), None)
    });
    let reference_path = objects
        .into_iter()
        .zip(&resolved.path.children)
        .map(|(origin_object, child)| LeakTraceReference {
            origin_object,
            reference_type: child.reference.location_type,
            owning_class_name: child.reference.owning_class_name.clone(),
            reference_name: child.reference.name.clone(),
        })
        .collect();

    LeakTrace {
        gc_root_type: resolved.path.root.gc_root.kind,
        reference_path,
        leaking_object,
    }
}
