use crate::{Landmark, Sighting};

/// The tagged variant consumed by the persistence pipeline's single
/// background writer. `LongSpawn` reuses `Sighting`'s shape; the
/// pipeline branches on the variant, not on a field, to decide whether
/// to upsert-without-commit or insert-with-commit.
#[derive(Debug, Clone)]
pub enum PipelineItem {
    Sighting(Sighting),
    LongSpawn(Sighting),
    Fort(Landmark),
    /// Drain remaining items, then the consumer exits.
    Kill,
}
