use taxrag_core::config::EmbeddingSettings;
use taxrag_embed::get_default_embedder;

fn main() -> anyhow::Result<()> {
    let embedder = get_default_embedder(&EmbeddingSettings::default())?;
    let texts = vec!["What is Section 80C?".to_string(), "HRA exemption rules".to_string()];
    let embs = embedder.embed_batch(&texts)?;
    println!("B={} dim={}", embs.len(), embedder.dim());
    Ok(())
}
