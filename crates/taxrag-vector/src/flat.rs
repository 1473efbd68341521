use anyhow::{Result, ensure};

use taxrag_core::traits::VectorIndex;
use taxrag_core::types::SearchHit;

/// Exact nearest-neighbour search by squared L2 distance over vectors held in memory.
///
/// Row `i` is chunk id `i`. Equal distances keep row order.
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    dim: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self { Self { dim, vectors: Vec::new() } }

    pub fn from_vectors(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dim = vectors.first().map_or(0, Vec::len);
        let mut index = Self::new(dim);
        for v in vectors { index.add(v)?; }
        Ok(index)
    }

    pub fn add(&mut self, vector: Vec<f32>) -> Result<()> {
        ensure!(vector.len() == self.dim, "vector width {} != index width {}", vector.len(), self.dim);
        self.vectors.push(vector);
        Ok(())
    }

    pub fn dim(&self) -> usize { self.dim }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl VectorIndex for FlatIndex {
    fn len(&self) -> usize { self.vectors.len() }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 || self.vectors.is_empty() { return Ok(Vec::new()); }
        ensure!(query.len() == self.dim, "query width {} != index width {}", query.len(), self.dim);
        let mut hits: Vec<SearchHit> = self.vectors.iter().enumerate()
            .map(|(id, v)| SearchHit { id, distance: squared_l2(query, v) })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }
}
