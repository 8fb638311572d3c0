//! Integration tests for the stream layer.
//!
//! These exercise the public API the way the codec crates do: an encoder
//! fills a [`GrowableStream`], and a decoder reads the finished bytes back
//! through a [`SliceStream`] or a reopened owned stream.

use wirekit_stream::{
    GrowableStream, SliceStream, Stream, StreamConfig, StreamError, read_block_data,
    read_block_length, read_u32, write_block, write_u32,
};

/// Writes `count` followed by that many blocks, like a collection would.
fn write_frame(stream: &mut dyn Stream, items: &[&str]) -> Result<(), StreamError> {
    write_u32(stream, items.len() as u32)?;
    for item in items {
        write_block(stream, item.as_bytes())?;
    }
    Ok(())
}

fn read_frame(stream: &mut dyn Stream) -> Result<Vec<String>, StreamError> {
    let count = read_u32(stream)?;
    let mut items = Vec::new();
    for _ in 0..count {
        let len = read_block_length(stream)?;
        let data = read_block_data(stream, len)?;
        items.push(String::from_utf8_lossy(data).into_owned());
    }
    Ok(items)
}

#[test]
fn test_frames_written_by_owned_stream_read_by_slice() {
    let mut out = GrowableStream::new();
    write_frame(&mut out, &["alpha", "", "gamma"]).unwrap();
    write_frame(&mut out, &["second"]).unwrap();

    let bytes = out.into_bytes();
    let mut input = SliceStream::new(&bytes);
    assert_eq!(read_frame(&mut input).unwrap(), ["alpha", "", "gamma"]);
    assert_eq!(read_frame(&mut input).unwrap(), ["second"]);
    assert_eq!(input.bytes_left(), 0);
}

#[test]
fn test_truncated_frame_underflows() {
    let mut out = GrowableStream::new();
    write_frame(&mut out, &["alpha", "beta"]).unwrap();
    let bytes = &out.as_bytes()[..out.len() - 1];

    let mut input = SliceStream::new(bytes);
    assert!(matches!(
        read_frame(&mut input),
        Err(StreamError::Underflow { requested: 4, available: 3 })
    ));
}

#[test]
fn test_config_from_json_drives_growth() {
    let config: StreamConfig =
        serde_json::from_str(r#"{ "linear_growth": 8, "alignment": 16, "shrink_floor": 64 }"#)
            .unwrap();
    let mut out = GrowableStream::with_config(config.clone());
    write_frame(&mut out, &["a fairly long entry that forces a few growth steps"]).unwrap();

    assert_eq!(out.config(), &config);
    assert!(out.capacity() >= out.len());
}

#[test]
fn test_rewind_and_overwrite_count() {
    let mut out = GrowableStream::new();
    write_frame(&mut out, &["x", "y"]).unwrap();
    out.set_position(0).unwrap();
    write_u32(&mut out, 1).unwrap();

    out.set_position(0).unwrap();
    assert_eq!(read_frame(&mut out).unwrap(), ["x"]);
    assert!(out.bytes_left() > 0);
}
