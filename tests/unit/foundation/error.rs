use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        StageError::protocol("x")
            .to_string()
            .contains("protocol error:")
    );
    assert!(StageError::decode("x").to_string().contains("decode error:"));
    assert!(
        StageError::compositing("x")
            .to_string()
            .contains("compositing error:")
    );
    assert!(
        StageError::font_load("x")
            .to_string()
            .contains("font load failure:")
    );
    assert!(
        StageError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(StageError::busy("x").to_string().contains("busy:"));
    assert!(StageError::render("x").to_string().contains("render error:"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = StageError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
