//! Hierarchical timing spans for diagnosing concurrent category searches.
//!
//! A [`Span`] is a cheap handle to a node that owns its children. Every node guards its own
//! mutable state with its own lock, so category tasks writing into sibling subtrees never
//! contend. Nothing keeps a global registry of spans: dropping the root handle drops the tree.

use std::{
	collections::BTreeMap,
	fmt,
	future::Future,
	sync::{
		Arc, LazyLock, Mutex, MutexGuard,
		atomic::{AtomicBool, Ordering},
	},
	time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Result;
use sift_storage::{ConfigStore, TRACING_ENABLED_KEY, TRACING_OUTPUT_KEY};

pub const ROOT_OPERATION: &str = "search";
pub const TRACE_LOG_TARGET: &str = "sift::trace";

/// Handed to operations while tracing is disabled. Mutations on it are ignored.
static DISABLED_SPAN: LazyLock<Span> = LazyLock::new(Span::disabled);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(String),
}
impl fmt::Display for TagValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TagValue::Bool(value) => write!(f, "{value}"),
			TagValue::Int(value) => write!(f, "{value}"),
			TagValue::Float(value) => write!(f, "{value}"),
			TagValue::Str(value) => write!(f, "{value:?}"),
		}
	}
}
impl From<bool> for TagValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<i64> for TagValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}
impl From<usize> for TagValue {
	fn from(value: usize) -> Self {
		Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
	}
}
impl From<f64> for TagValue {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}
impl From<&str> for TagValue {
	fn from(value: &str) -> Self {
		Self::Str(value.to_string())
	}
}
impl From<String> for TagValue {
	fn from(value: String) -> Self {
		Self::Str(value)
	}
}

/// Serializable snapshot of a span subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanReport {
	pub operation: String,
	pub duration_ms: f64,
	#[serde(with = "crate::time_serde")]
	pub start_time: OffsetDateTime,
	#[serde(default, with = "crate::time_serde::option", skip_serializing_if = "Option::is_none")]
	pub end_time: Option<OffsetDateTime>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tags: Option<BTreeMap<String, TagValue>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub children: Option<Vec<SpanReport>>,
}
impl SpanReport {
	pub fn total_duration_ms(&self) -> f64 {
		self.duration_ms
			+ self.children.iter().flatten().map(SpanReport::total_duration_ms).sum::<f64>()
	}
}

#[derive(Clone)]
pub struct Span {
	node: Arc<SpanNode>,
}
impl Span {
	fn open(operation: impl Into<String>) -> Self {
		Self::with_mode(operation.into(), false)
	}

	fn disabled() -> Self {
		Self::with_mode("disabled".to_string(), true)
	}

	fn with_mode(operation: String, disabled: bool) -> Self {
		Self {
			node: Arc::new(SpanNode {
				operation,
				started: Instant::now(),
				started_at: OffsetDateTime::now_utc(),
				disabled,
				state: Mutex::new(SpanState::default()),
			}),
		}
	}

	pub fn is_disabled(&self) -> bool {
		self.node.disabled
	}

	pub fn operation(&self) -> &str {
		&self.node.operation
	}

	pub fn start_time(&self) -> OffsetDateTime {
		self.node.started_at
	}

	pub fn end_time(&self) -> Option<OffsetDateTime> {
		self.node.lock().end.map(|end| end.at)
	}

	pub fn is_finished(&self) -> bool {
		self.node.lock().end.is_some()
	}

	/// Appends a new open child. Safe to call from many tasks against the same parent.
	pub fn child(&self, operation: impl Into<String>) -> Span {
		if self.is_disabled() {
			return self.clone();
		}

		let child = Span::open(operation);

		self.node.lock().children.push(child.clone());

		child
	}

	pub fn set_tag(&self, key: impl Into<String>, value: impl Into<TagValue>) {
		if self.is_disabled() {
			return;
		}

		self.node.lock().tags.insert(key.into(), value.into());
	}

	pub fn tag(&self, key: &str) -> Option<TagValue> {
		self.node.lock().tags.get(key).cloned()
	}

	pub fn tags(&self) -> BTreeMap<String, TagValue> {
		self.node.lock().tags.clone()
	}

	pub fn children(&self) -> Vec<Span> {
		self.node.lock().children.clone()
	}

	/// Closes the span. Later calls keep the first end time.
	pub fn finish(&self) -> &Self {
		if self.is_disabled() {
			return self;
		}

		let mut state = self.node.lock();

		if state.end.is_none() {
			state.end = Some(SpanEnd {
				at: OffsetDateTime::now_utc(),
				duration: self.node.started.elapsed(),
			});
		}

		self
	}

	/// Own duration; an open span reports the time elapsed so far.
	pub fn duration(&self) -> Duration {
		match self.node.lock().end {
			Some(end) => end.duration,
			None => self.node.started.elapsed(),
		}
	}

	/// Own duration plus the own durations of every descendant. Concurrent children overlap,
	/// so this is work time, not wall-clock time.
	pub fn total_duration_ms(&self) -> f64 {
		let children = self.children();

		duration_ms(self.duration())
			+ children.iter().map(Span::total_duration_ms).sum::<f64>()
	}

	pub fn report(&self) -> SpanReport {
		let (end, tags, children) = {
			let state = self.node.lock();

			(state.end, state.tags.clone(), state.children.clone())
		};
		let duration = match end {
			Some(end) => end.duration,
			None => self.node.started.elapsed(),
		};

		SpanReport {
			operation: self.node.operation.clone(),
			duration_ms: duration_ms(duration),
			start_time: self.node.started_at,
			end_time: end.map(|end| end.at),
			tags: (!tags.is_empty()).then_some(tags),
			children: (!children.is_empty())
				.then(|| children.iter().map(Span::report).collect()),
		}
	}

	/// Depth-first indented tree, one span per line.
	pub fn render(&self) -> String {
		let mut out = String::new();

		render_into(&self.report(), 0, &mut out);

		out
	}

	pub fn render_json(&self) -> serde_json::Value {
		serde_json::to_value(self.report()).unwrap_or(serde_json::Value::Null)
	}
}
impl fmt::Debug for Span {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Span")
			.field("operation", &self.node.operation)
			.field("disabled", &self.node.disabled)
			.field("finished", &self.is_finished())
			.finish()
	}
}

struct SpanNode {
	operation: String,
	started: Instant,
	started_at: OffsetDateTime,
	disabled: bool,
	state: Mutex<SpanState>,
}
impl SpanNode {
	fn lock(&self) -> MutexGuard<'_, SpanState> {
		// State is only ever replaced field by field, so a poisoned guard is still consistent.
		self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

#[derive(Default)]
struct SpanState {
	end: Option<SpanEnd>,
	tags: BTreeMap<String, TagValue>,
	children: Vec<Span>,
}

#[derive(Clone, Copy)]
struct SpanEnd {
	at: OffsetDateTime,
	duration: Duration,
}

/// Process-wide tracing switches plus the span operations used by the search pipeline.
#[derive(Debug)]
pub struct Tracer {
	enabled: AtomicBool,
	output: AtomicBool,
}
impl Tracer {
	pub fn new(enabled: bool, output: bool) -> Self {
		Self { enabled: AtomicBool::new(enabled), output: AtomicBool::new(output) }
	}

	/// Starts from the configured defaults and lets flags persisted in the store override them.
	pub fn from_store(store: &dyn ConfigStore, defaults: sift_config::Tracing) -> Self {
		Self::new(
			load_flag(store, TRACING_ENABLED_KEY, defaults.enabled),
			load_flag(store, TRACING_OUTPUT_KEY, defaults.output),
		)
	}

	pub fn persist(&self, store: &dyn ConfigStore) -> Result<()> {
		store.set_bytes(TRACING_ENABLED_KEY, &serde_json::to_vec(&self.is_enabled())?)?;
		store.set_bytes(TRACING_OUTPUT_KEY, &serde_json::to_vec(&self.is_output_enabled())?)?;

		Ok(())
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled.load(Ordering::Relaxed)
	}

	pub fn set_enabled(&self, enabled: bool) {
		self.enabled.store(enabled, Ordering::Relaxed);
	}

	pub fn is_output_enabled(&self) -> bool {
		self.output.load(Ordering::Relaxed)
	}

	/// Affects traces emitted from now on only.
	pub fn set_output_enabled(&self, output: bool) {
		self.output.store(output, Ordering::Relaxed);
	}

	/// Opens the root span for one search. Returns the shared disabled span when tracing is off.
	pub fn start_root(&self, query: &str) -> Span {
		if !self.is_enabled() {
			return DISABLED_SPAN.clone();
		}

		let root = Span::open(ROOT_OPERATION);

		root.set_tag("query", query);

		root
	}

	pub fn child(&self, parent: &Span, operation: impl Into<String>) -> Span {
		parent.child(operation)
	}

	pub fn set_tag(&self, span: &Span, key: impl Into<String>, value: impl Into<TagValue>) {
		span.set_tag(key, value);
	}

	pub fn finish<'a>(&self, span: &'a Span) -> &'a Span {
		span.finish()
	}

	/// Runs one category search inside its own child span and records how many results it
	/// produced.
	pub fn trace_category<T, F>(&self, name: &str, parent: &Span, op: F) -> Vec<T>
	where
		F: FnOnce(&Span) -> Vec<T>,
	{
		if !self.is_enabled() || parent.is_disabled() {
			return op(&*DISABLED_SPAN);
		}

		let guard = CategoryGuard::open(name, parent);
		let results = op(&guard.span);

		guard.close(results.len());

		results
	}

	/// Async form of [`Tracer::trace_category`] for providers that await their candidates.
	pub async fn trace_category_async<T, F, Fut>(&self, name: &str, parent: &Span, op: F) -> Vec<T>
	where
		F: FnOnce(Span) -> Fut,
		Fut: Future<Output = Vec<T>>,
	{
		if !self.is_enabled() || parent.is_disabled() {
			return op(DISABLED_SPAN.clone()).await;
		}

		let guard = CategoryGuard::open(name, parent);
		let results = op(guard.span.clone()).await;

		guard.close(results.len());

		results
	}

	pub fn total_duration(&self, span: &Span) -> f64 {
		span.total_duration_ms()
	}

	pub fn render(&self, span: &Span) -> String {
		span.render()
	}

	pub fn render_json(&self, span: &Span) -> serde_json::Value {
		span.render_json()
	}

	/// Emits a finished trace when output is enabled. Returns whether anything was emitted.
	pub fn emit(&self, span: &Span) -> bool {
		if !self.is_output_enabled() || span.is_disabled() {
			return false;
		}

		tracing::info!(
			target: TRACE_LOG_TARGET,
			total_ms = span.total_duration_ms(),
			trace = %span.render(),
			"Search trace.",
		);

		true
	}
}
impl Default for Tracer {
	fn default() -> Self {
		Self::new(false, false)
	}
}

/// Keeps a category span closable when its operation unwinds instead of returning.
struct CategoryGuard {
	span: Span,
	closed: bool,
}
impl CategoryGuard {
	fn open(name: &str, parent: &Span) -> Self {
		let span = parent.child(format!("category:{name}"));

		span.set_tag("category", name);

		Self { span, closed: false }
	}

	fn close(mut self, results: usize) {
		self.span.set_tag("resultsCount", results);
		self.span.set_tag("matched", results > 0);
		self.span.finish();

		self.closed = true;
	}
}
impl Drop for CategoryGuard {
	fn drop(&mut self) {
		if self.closed {
			return;
		}

		self.span.set_tag("matched", false);
		self.span.finish();
	}
}

fn load_flag(store: &dyn ConfigStore, key: &str, default: bool) -> bool {
	match store.get_bytes(key) {
		Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
			tracing::warn!(key, error = %err, "Stored tracing flag is corrupt. Using default.");

			default
		}),
		Ok(None) => default,
		Err(err) => {
			tracing::warn!(key, error = %err, "Failed to read tracing flag. Using default.");

			default
		},
	}
}

fn duration_ms(duration: Duration) -> f64 {
	duration.as_secs_f64() * 1_000.0
}

fn render_into(report: &SpanReport, depth: usize, out: &mut String) {
	let indent = "  ".repeat(depth);
	let state = match report.end_time {
		Some(_) => format!("{:.3}ms", report.duration_ms),
		None => format!("{:.3}ms, open", report.duration_ms),
	};

	out.push_str(&format!(
		"{indent}{} ({state}) @ {}",
		report.operation,
		crate::time_serde::display(&report.start_time),
	));

	if let Some(tags) = report.tags.as_ref() {
		let rendered: Vec<String> = tags.iter().map(|(key, value)| format!("{key}={value}")).collect();

		out.push_str(&format!(" [{}]", rendered.join(", ")));
	}

	out.push('\n');

	for child in report.children.iter().flatten() {
		render_into(child, depth + 1, out);
	}
}
