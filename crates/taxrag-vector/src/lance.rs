use anyhow::{Result, anyhow};
use arrow_array::{Array, Float32Array, Int32Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::DistanceType;
use std::sync::Arc;

use taxrag_core::store::ChunkStore;
use taxrag_core::traits::{CorpusLoader, LoadedCorpus, VectorIndex};
use taxrag_core::types::{Chunk, ContentType, DocumentLocation, Page, SearchHit};

use crate::metadata::read_metadata_lenient;
use crate::table::{open_db, open_table_if_exists};

/// Vector search over a native LanceDB chunk table.
///
/// LanceDB is async; the index owns a runtime and blocks on each call so it can
/// sit behind the synchronous `VectorIndex` trait.
pub struct LanceVectorIndex { rt: tokio::runtime::Runtime, table: lancedb::Table, rows: usize }

impl LanceVectorIndex {
	pub fn open(rt: tokio::runtime::Runtime, table: lancedb::Table) -> Result<Self> {
		let rows = rt.block_on(async { table.count_rows(None).await })?;
		Ok(Self { rt, table, rows })
	}

	/// Scan every row into a chunk store.
	pub fn read_chunks(&self) -> Result<ChunkStore> {
		self.rt.block_on(async {
			let mut stream = self.table.query().execute().await?;
			let mut store = ChunkStore::new();
			while let Some(batch) = stream.try_next().await? {
				for chunk in chunks_from_batch(&batch)? { store.insert(chunk); }
			}
			Ok(store)
		})
	}
}

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<StringArray>()).ok_or_else(|| anyhow!("column '{}' missing or not utf8", name))
}

fn int_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array> {
	batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<Int32Array>()).ok_or_else(|| anyhow!("column '{}' missing or not int32", name))
}

fn chunk_id(raw: i32) -> Result<usize> { usize::try_from(raw).map_err(|_| anyhow!("negative chunk id {}", raw)) }

fn chunks_from_batch(batch: &RecordBatch) -> Result<Vec<Chunk>> {
	let ids = int_col(batch, "id")?;
	let contents = string_col(batch, "content")?;
	let pages = int_col(batch, "page")?;
	let sections = string_col(batch, "section")?;
	let kinds = string_col(batch, "content_type")?;
	(0..batch.num_rows()).map(|i| {
		let page = if pages.is_null(i) { Page::Unknown } else { u32::try_from(pages.value(i)).map_or(Page::Unknown, Page::Number) };
		Ok(Chunk {
			id: chunk_id(ids.value(i))?,
			text: contents.value(i).to_string(),
			page,
			section: sections.value(i).to_string(),
			content_type: ContentType::parse_lenient(kinds.value(i)),
		})
	}).collect()
}

impl VectorIndex for LanceVectorIndex {
	fn len(&self) -> usize { self.rows }

	fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
		if k == 0 || self.rows == 0 { return Ok(Vec::new()); }
		self.rt.block_on(async {
			let mut stream = self.table.vector_search(query.to_vec())?.distance_type(DistanceType::L2).limit(k).execute().await?;
			let mut hits = Vec::new();
			while let Some(batch) = stream.try_next().await? {
				let ids = int_col(&batch, "id")?;
				let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>()).ok_or_else(|| anyhow!("_distance column missing"))?;
				for i in 0..batch.num_rows() { hits.push(SearchHit { id: chunk_id(ids.value(i))?, distance: distances.value(i) }); }
			}
			hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
			Ok(hits)
		})
	}
}

/// Loads `<doc>_vectors/` as a LanceDB database holding one chunk table.
#[derive(Debug, Clone)]
pub struct NativeLoader { table_name: String }

impl NativeLoader {
	pub fn new(table_name: &str) -> Self { Self { table_name: table_name.to_string() } }
}

impl CorpusLoader for NativeLoader {
	fn name(&self) -> &'static str { "native" }

	fn load(&self, location: &DocumentLocation) -> Result<LoadedCorpus> {
		let rt = tokio::runtime::Runtime::new()?;
		let uri = location.vector_dir.to_string_lossy().to_string();
		let table = rt.block_on(async {
			let db = open_db(&uri).await?;
			open_table_if_exists(&db, &self.table_name).await
		})?.ok_or_else(|| anyhow!("table '{}' not found in {}", self.table_name, uri))?;
		let index = LanceVectorIndex::open(rt, table)?;
		let store = index.read_chunks()?;
		let source_name = read_metadata_lenient(&location.metadata_file).and_then(|m| m.filename);
		tracing::info!(document = %location.document_id, chunks = store.len(), rows = index.len(), "loaded native store");
		Ok(LoadedCorpus { index: Arc::new(index), store, source_name })
	}
}
