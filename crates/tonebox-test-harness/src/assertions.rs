use tonebox_core::history::FilterHistory;
use tonebox_core::pipeline::FrameBuffer;

/// Assert two frames have the same size and byte-identical pixels.
pub fn assert_frames_identical(actual: &FrameBuffer, expected: &FrameBuffer) {
    assert_eq!(
        (actual.width, actual.height),
        (expected.width, expected.height),
        "frame sizes differ"
    );
    if let Some(i) = actual
        .data
        .iter()
        .zip(&expected.data)
        .position(|(a, b)| a != b)
    {
        let pixel = i / 4;
        let (x, y) = (pixel as u32 % actual.width, pixel as u32 / actual.width);
        panic!(
            "frames differ at ({x}, {y}): {:?} != {:?}",
            actual.pixel(x, y),
            expected.pixel(x, y)
        );
    }
}

/// Assert two frames differ in size or in at least one byte.
pub fn assert_frames_differ(a: &FrameBuffer, b: &FrameBuffer) {
    assert!(a != b, "expected frames to differ, but they are identical");
}

/// Assert history length and cursor. `cursor` is `None` for an empty history.
pub fn assert_history_shape(history: &FilterHistory, len: usize, cursor: Option<usize>) {
    assert_eq!(
        history.len(),
        len,
        "history has {} entries, expected {}",
        history.len(),
        len
    );
    assert_eq!(
        history.cursor(),
        cursor,
        "history cursor is {:?}, expected {:?}",
        history.cursor(),
        cursor
    );
}
