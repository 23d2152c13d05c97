use sift_domain::Category;

/// Boost derived from how often an item has been picked.
///
/// `factor` runs once per candidate on the scoring hot path and must not block. Implementations
/// that persist selections must do so off the read path.
pub trait UsageFactors
where
	Self: Send + Sync,
{
	fn factor(&self, category: Category, identifier: &str) -> f64;

	fn record_selection(&self, category: Category, identifier: &str);
}

/// Applies no personalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralUsage;
impl UsageFactors for NeutralUsage {
	fn factor(&self, _category: Category, _identifier: &str) -> f64 {
		1.0
	}

	fn record_selection(&self, category: Category, identifier: &str) {
		tracing::trace!(category = %category, identifier, "Selection recorded without usage model.");
	}
}
