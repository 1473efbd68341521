use taxrag_core::config::EmbeddingSettings;
use taxrag_core::traits::Embedder;
use taxrag_embed::{get_default_embedder, FakeEmbedder, MINILM_DIM};

fn cosine(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

#[test]
fn fake_embedder_shapes_and_determinism() {
    // Force fake embedder to avoid loading a model
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let embedder = get_default_embedder(&EmbeddingSettings::default()).expect("embedder");
    let texts = vec!["What is Section 80C?".to_string(), "What is Section 80C?".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), MINILM_DIM);
    assert_eq!(embedder.dim(), MINILM_DIM);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn shared_tokens_are_closer_than_disjoint_ones() {
    let e = FakeEmbedder::new(64);
    let q = e.embed("hra exemption rules").unwrap();
    let near = e.embed("HRA exemption, rules apply").unwrap();
    let far = e.embed("penalty for late filing").unwrap();
    assert!(cosine(&q, &near) > cosine(&q, &far));
}
