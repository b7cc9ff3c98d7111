use eduquery_text::{SparseIndex, TfidfVectorizer, VectorizerOptions};

fn biology() -> Vec<&'static str> {
    vec![
        "Photosynthesis converts light to energy.",
        "Mitosis is cell division.",
        "Plants use chlorophyll.",
    ]
}

#[test]
fn vocabulary_is_sorted_and_idf_smoothed() {
    let v = TfidfVectorizer::fit(VectorizerOptions::default(), &["cell cell wall", "cell membrane"]).expect("fit");
    let terms: Vec<&str> = v.vocabulary().keys().map(String::as_str).collect();
    assert_eq!(terms, vec!["cell", "membrane", "wall"]);
    assert_eq!(v.vocabulary()["cell"], 0);
    // df(cell) = 2 of 2 docs -> ln(3/3) + 1
    assert!((v.idf("cell").unwrap() - 1.0).abs() < 1e-6);
    assert!((v.idf("wall").unwrap() - ((3.0f32 / 2.0).ln() + 1.0)).abs() < 1e-6);
}

#[test]
fn rows_are_unit_length() {
    let idx = SparseIndex::fit(VectorizerOptions::default(), &biology()).expect("fit");
    for row in &idx.matrix.rows {
        assert!((row.norm() - 1.0).abs() < 1e-5);
    }
}

#[test]
fn max_features_keeps_most_frequent_terms() {
    let opts = VectorizerOptions { max_features: 2, stop_words: true };
    let v = TfidfVectorizer::fit(opts, &["zeta zeta alpha", "zeta beta beta", "gamma"]).expect("fit");
    let terms: Vec<&str> = v.vocabulary().keys().map(String::as_str).collect();
    assert_eq!(terms, vec!["beta", "zeta"]);
}

#[test]
fn empty_vocabulary_is_an_error() {
    assert!(TfidfVectorizer::fit(VectorizerOptions::default(), &["the of and", "a"]).is_err());
    assert!(TfidfVectorizer::fit(VectorizerOptions::default(), &Vec::<String>::new()).is_err());
}

#[test]
fn chlorophyll_example_prefers_plants_chunk() {
    let idx = SparseIndex::fit(VectorizerOptions::default(), &biology()).expect("fit");
    let hits = idx.search("What pigment captures light in plants?", 1);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].index, 2);
}

#[test]
fn unknown_query_scores_zero_and_keeps_insertion_order() {
    let idx = SparseIndex::fit(VectorizerOptions::default(), &biology()).expect("fit");
    let hits = idx.search("quantum chromodynamics", 3);
    let order: Vec<usize> = hits.iter().map(|h| h.index).collect();
    assert_eq!(order, vec![0, 1, 2]);
    assert!(hits.iter().all(|h| h.score == 0.0));
}

#[test]
fn fitted_state_survives_serde() {
    let idx = SparseIndex::fit(VectorizerOptions::default(), &biology()).expect("fit");
    let json = serde_json::to_string(&idx).expect("encode");
    let back: SparseIndex = serde_json::from_str(&json).expect("decode");
    assert_eq!(back, idx);
    assert_eq!(back.search("chlorophyll", 1)[0].index, 2);
}

#[test]
fn restored_index_with_out_of_range_term_fails_validation() {
    let index = SparseIndex::fit(VectorizerOptions::default(), &biology()).expect("fit");
    assert!(index.validate().is_ok());

    let mut raw = serde_json::to_value(&index).unwrap();
    raw["vectorizer"]["vocabulary"]["chlorophyll"] = serde_json::json!(999);
    let broken: SparseIndex = serde_json::from_value(raw).unwrap();
    assert!(broken.validate().is_err());
    // Transforming through the broken vocabulary skips the bad term.
    assert!(broken.scores("chlorophyll").iter().all(|s| *s == 0.0));
    assert_eq!(broken.vectorizer.idf("chlorophyll"), None);
}

#[test]
fn matrix_from_another_term_space_fails_validation() {
    let mut index = SparseIndex::fit(VectorizerOptions::default(), &biology()).expect("fit");
    index.matrix.n_features += 1;
    assert!(index.validate().is_err());
}
