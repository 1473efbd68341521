use anyhow::{Result, ensure};
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use std::path::Path;
use std::sync::Arc;

use taxrag_core::types::{Chunk, Page};

use crate::schema::build_chunk_schema;
use crate::table::{has_table, open_db};

/// Write (or append) chunks and their vectors into a native LanceDB chunk table.
///
/// Used by fixtures and ingestion hosts; the serving path only reads.
pub async fn write_native_store(db_path: &Path, table_name: &str, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()> {
	ensure!(chunks.len() == vectors.len(), "chunks ({}) and vectors ({}) length must match", chunks.len(), vectors.len());
	if chunks.is_empty() { tracing::warn!(table = table_name, "no chunks to write"); return Ok(()); }
	let dim = vectors[0].len();
	ensure!(vectors.iter().all(|v| v.len() == dim), "all vectors must have width {}", dim);
	let schema = build_chunk_schema(i32::try_from(dim)?);

	let ids: Vec<i32> = chunks.iter().map(|c| i32::try_from(c.id)).collect::<Result<_, _>>()?;
	let contents: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
	let pages: Vec<Option<i32>> = chunks.iter().map(|c| match c.page { Page::Number(n) => i32::try_from(n).ok(), Page::Unknown => None }).collect();
	let sections: Vec<String> = chunks.iter().map(|c| c.section.clone()).collect();
	let kinds: Vec<&str> = chunks.iter().map(|c| c.content_type.as_str()).collect();
	let vecs: Vec<Option<Vec<Option<f32>>>> = vectors.iter().map(|v| Some(v.iter().copied().map(Some).collect())).collect();

	let batch = RecordBatch::try_new(schema.clone(), vec![
		Arc::new(Int32Array::from(ids)),
		Arc::new(StringArray::from(contents)),
		Arc::new(Int32Array::from(pages)),
		Arc::new(StringArray::from(sections)),
		Arc::new(StringArray::from(kinds)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vecs.into_iter(), i32::try_from(dim)?)),
	])?;
	let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));

	let db = open_db(db_path.to_string_lossy().as_ref()).await?;
	if has_table(&db, table_name).await? {
		db.open_table(table_name).execute().await?.add(reader).execute().await?;
	} else {
		db.create_table(table_name, reader).execute().await?;
	}
	tracing::info!(table = table_name, rows = chunks.len(), "wrote native chunk store");
	Ok(())
}
