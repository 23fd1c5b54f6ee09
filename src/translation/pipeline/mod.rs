//! 翻译管道模块
//!
//! 提供文本处理管道，包括收集、过滤、分句和批次处理

pub mod batch;
pub mod collector;
pub mod filters;
pub mod segmenter;
pub mod visibility;

// 重新导出主要类型
pub use batch::{chunk_by_limits, context_key, group_by_context, Batch, BatchLimits, ContextBatcher, ContextGroup};
pub use collector::{
    read_attribute_records, AttributeRecord, AttributeRecords, AttributeTarget, AttributeUnit,
    TextCollector, TextUnit, TextUnits,
};
pub use filters::{FilterReason, FilterStats, TextFilter};
pub use segmenter::SentenceSegmenter;
pub use visibility::{InlineStyleProbe, VisibilityCache, VisibilityProbe};
