use eduquery_core::config::EmbedderSettings;
use eduquery_embed::{get_default_embedder, FakeEmbedder};
use eduquery_core::traits::Embedder;

fn fake_settings() -> EmbedderSettings {
    EmbedderSettings { use_fake: true, fake_dim: 256, ..EmbedderSettings::default() }
}

#[test]
fn fake_embedder_shapes_and_determinism() {
    let embedder = get_default_embedder(&fake_settings()).expect("embedder");
    let texts = vec!["hello world".to_string(), "Hello, WORLD!".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 256, "embedding dim follows fake_dim");
    assert_eq!(embedder.dim(), 256);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Case and punctuation do not change the tokens
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_embedder_id_names_dimension() {
    assert_eq!(FakeEmbedder::new(64).embedder_id(), "fake:xxh64:d64");
}

#[test]
fn disabled_embedder_is_unavailable() {
    let settings = EmbedderSettings { enabled: false, use_fake: true, ..EmbedderSettings::default() };
    assert!(get_default_embedder(&settings).is_err());
}

#[test]
fn missing_model_dir_is_unavailable() {
    let settings = EmbedderSettings { model_dir: Some("/nonexistent/bge-m3".into()), ..EmbedderSettings::default() };
    assert!(get_default_embedder(&settings).is_err());
}
