use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        DualAlphaError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        DualAlphaError::dispatch("x")
            .to_string()
            .contains("dispatch error:")
    );
    assert!(
        DualAlphaError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = DualAlphaError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn serde_json_errors_map_to_serde_variant() {
    let e = serde_json::from_str::<u32>("not json").unwrap_err();
    let err = DualAlphaError::from(e);
    assert!(matches!(err, DualAlphaError::Serde(_)));
}
