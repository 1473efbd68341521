use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Columns of a native chunk table. `page` is null when unknown.
pub fn build_chunk_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Int32, false),
		Field::new("content", DataType::Utf8, false),
		Field::new("page", DataType::Int32, true),
		Field::new("section", DataType::Utf8, false),
		Field::new("content_type", DataType::Utf8, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
