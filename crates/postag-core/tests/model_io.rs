use candle_core::Device;
use postag_core::model::{CONFIG_FILE, TAGS_FILE, WEIGHTS_FILE};
use postag_core::{Tagger, TaggerConfig, TagMap, TaggerError};

fn small_tagger() -> Tagger {
    let tags = TagMap::from(vec![
        "DET".to_string(),
        "NOUN".to_string(),
        "VERB".to_string(),
        "PUNCT".to_string(),
    ]);
    let config = TaggerConfig {
        width: 16,
        vector_length: 12,
        n_tags: tags.len(),
        ..Default::default()
    };
    Tagger::new(config, tags, &Device::Cpu).unwrap()
}

#[test]
fn save_then_load_gives_same_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let tagger = small_tagger();
    tagger.save(dir.path()).unwrap();

    for file in [WEIGHTS_FILE, CONFIG_FILE, TAGS_FILE] {
        assert!(dir.path().join(file).exists(), "{file} was not written");
    }

    let loaded = Tagger::load(dir.path(), &Device::Cpu).unwrap();
    assert_eq!(loaded.config(), tagger.config());
    assert_eq!(loaded.tags(), tagger.tags());

    let sentences = vec![vec!["El", "perro", "come", "."], vec!["Llueve", "."]];
    let batch: Vec<_> = sentences
        .iter()
        .map(|s| tagger.extractor().extract(s.as_slice()))
        .collect();

    let before = tagger.predict_proba(&batch).unwrap().to_vec2::<f32>().unwrap();
    let after = loaded.predict_proba(&batch).unwrap().to_vec2::<f32>().unwrap();
    assert_eq!(before, after);
}

#[test]
fn load_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = Tagger::load(dir.path().join("nope"), &Device::Cpu).err().unwrap();
    assert!(matches!(err, TaggerError::ModelLoad { .. }));
}

#[test]
fn weights_use_layer_names() {
    let dir = tempfile::tempdir().unwrap();
    small_tagger().save(dir.path()).unwrap();

    let bytes = std::fs::read(dir.path().join(WEIGHTS_FILE)).unwrap();
    let tensors = safetensors::SafeTensors::deserialize(&bytes).unwrap();
    let names = tensors.names();

    for expected in [
        "embed_lower.weight",
        "embed_suffix.weight",
        "maxout.weight",
        "bilstm.weight_ih_l0",
        "bilstm.weight_hh_l0_reverse",
        "softmax.bias",
    ] {
        assert!(names.iter().any(|n| *n == expected), "missing {expected}");
    }
    assert_eq!(tensors.tensor("embed_shape.weight").unwrap().shape(), &[200, 8]);
}
