use frame::{Frame, FrameError, decode_frame, encode_png};

#[test]
fn test_frame_solid_rgb() {
    let frame = Frame::solid(4, 2, &[255, 0, 0]).unwrap();
    assert_eq!(frame.width(), 4);
    assert_eq!(frame.height(), 2);
    assert_eq!(frame.channels(), 3);
    assert_eq!(frame.depth(), 8);
    match &frame {
        Frame::U8(t) => assert_eq!(&t.data[..6], &[255, 0, 0, 255, 0, 0]),
        _ => panic!("expected U8 frame"),
    }
}

#[test]
fn test_frame_rgba8_shape_mismatch() {
    assert!(Frame::rgba8(2, 2, vec![0; 15]).is_err());
}

#[test]
fn test_frame_empty() {
    let frame = Frame::rgb8(0, 0, vec![]).unwrap();
    assert!(frame.is_empty());
    assert_eq!(frame.width(), 0);
}

#[tokio::test]
async fn test_encode_png_then_decode_keeps_size() {
    let rgba = vec![10.0, 20.0, 30.0, 255.0].repeat(6);
    let png = encode_png(rgba, 3, 2).await.unwrap();
    let frame = decode_frame(&png).await.unwrap();
    assert_eq!(frame.shape(), &[2, 3, 4]);
    match frame {
        Frame::U8(t) => assert_eq!(&t.data[..4], &[10, 20, 30, 255]),
        _ => panic!("expected U8 frame"),
    }
}

#[tokio::test]
async fn test_encode_png_short_buffer() {
    let result = encode_png(vec![0.0; 7], 2, 1).await;
    assert!(matches!(
        result,
        Err(FrameError::ShortBuffer {
            width: 2,
            height: 1,
            needed: 8,
            got: 7
        })
    ));
}

#[tokio::test]
async fn test_decode_garbage() {
    let result = decode_frame(&[0x00, 0x01, 0x02]).await;
    assert!(matches!(result, Err(FrameError::Decode(_))));
    let err = result.err().unwrap();
    assert!(std::error::Error::source(&err).is_some());
    assert!(err.to_string().starts_with("cannot decode frame"));
}

#[test]
fn test_frame_len_counts_held_samples() {
    let frame = Frame::U8(base::Tensor {
        shape: vec![2, 2, 3],
        data: vec![1, 2, 3],
    });
    assert_eq!(frame.len(), 3);
    assert_eq!(Frame::solid(2, 2, &[1, 2, 3]).unwrap().len(), 12);
}
