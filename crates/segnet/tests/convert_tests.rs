use base::Tensor;
use frame::Frame;
use segnet::{AllocationError, ConversionError, Device, DeviceArena, FormatConverter};

#[test]
fn test_rgb8_gets_opaque_alpha() {
    let mut converter = FormatConverter::new(DeviceArena::new(Device::Cpu));
    let frame = Frame::rgb8(2, 1, vec![10, 20, 30, 40, 50, 60]).unwrap();
    let tensor = converter.convert(&frame, [0.0; 3]).unwrap();
    assert_eq!((tensor.width(), tensor.height()), (2, 1));
    assert_eq!(
        tensor.as_slice(),
        &[10.0, 20.0, 30.0, 255.0, 40.0, 50.0, 60.0, 255.0]
    );
}

#[test]
fn test_rgba8_keeps_alpha_and_subtracts_mean() {
    let mut converter = FormatConverter::new(DeviceArena::new(Device::Cpu));
    let frame = Frame::rgba8(1, 1, vec![200, 100, 50, 7]).unwrap();
    let tensor = converter.convert(&frame, [100.0, 50.0, 25.0]).unwrap();
    assert_eq!(tensor.pixel(0, 0), [100.0, 50.0, 25.0, 7.0]);
    assert_eq!(tensor.rgba_at(0, 0), [200.0, 100.0, 50.0, 7.0]);
    assert_eq!(tensor.mean_pixel(), [100.0, 50.0, 25.0]);
}

#[test]
fn test_sample_depths_share_one_scale() {
    let mut converter = FormatConverter::new(DeviceArena::new(Device::Cpu));

    let u16_frame = Frame::U16(Tensor::new(vec![1, 1, 3], vec![65535, 0, 257]).unwrap());
    let tensor = converter.convert(&u16_frame, [0.0; 3]).unwrap();
    let expected = [255.0, 0.0, 1.0, 255.0];
    for (got, want) in tensor.pixel(0, 0).iter().zip(expected) {
        assert!((got - want).abs() < 1e-3, "{got} != {want}");
    }

    let f32_frame = Frame::F32(Tensor::new(vec![1, 1, 4], vec![1.0, 0.5, 0.0, 1.0]).unwrap());
    let tensor = converter.convert(&f32_frame, [0.0; 3]).unwrap();
    assert_eq!(tensor.pixel(0, 0), [255.0, 127.5, 0.0, 255.0]);
}

#[test]
fn test_same_size_reuses_tensor_memory() {
    let arena = DeviceArena::new(Device::Cpu);
    let mut converter = FormatConverter::new(arena.clone());
    let frame = Frame::solid(8, 4, &[1, 2, 3]).unwrap();
    converter.convert(&frame, [0.0; 3]).unwrap();
    let bytes = arena.live_bytes();
    assert_eq!(bytes, 8 * 4 * 4 * 4);

    converter.convert(&frame, [0.0; 3]).unwrap();
    assert_eq!(arena.live_bytes(), bytes);
    assert_eq!(arena.live_buffers(), 1);

    // a new size replaces the tensor rather than adding one
    converter
        .convert(&Frame::solid(2, 2, &[1, 2, 3]).unwrap(), [0.0; 3])
        .unwrap();
    assert_eq!(arena.live_buffers(), 1);
    assert_eq!(arena.live_bytes(), 2 * 2 * 4 * 4);

    converter.release();
    assert_eq!(arena.live_bytes(), 0);
}

#[test]
fn test_failed_conversion_invalidates_tensor() {
    let mut converter = FormatConverter::new(DeviceArena::new(Device::Cpu));
    converter
        .convert(&Frame::solid(2, 2, &[9, 9, 9]).unwrap(), [0.0; 3])
        .unwrap();
    assert!(converter.tensor().is_some());

    let err = converter
        .convert(&Frame::solid(2, 2, &[1, 2]).unwrap(), [0.0; 3])
        .unwrap_err();
    assert_eq!(err, ConversionError::UnsupportedChannels(2));
    assert!(converter.tensor().is_none());
}

#[test]
fn test_malformed_frames() {
    let mut converter = FormatConverter::new(DeviceArena::new(Device::Cpu));

    let empty = Frame::rgb8(0, 3, vec![]).unwrap();
    assert_eq!(
        converter.convert(&empty, [0.0; 3]).unwrap_err(),
        ConversionError::EmptyFrame
    );

    let flat = Frame::U8(Tensor::new(vec![12], vec![0; 12]).unwrap());
    assert!(matches!(
        converter.convert(&flat, [0.0; 3]),
        Err(ConversionError::Malformed(_))
    ));
}

#[test]
fn test_allocation_failure_surfaces() {
    let mut converter = FormatConverter::new(DeviceArena::with_budget(Device::Cpu, 16));
    let err = converter
        .convert(&Frame::solid(2, 2, &[1, 2, 3]).unwrap(), [0.0; 3])
        .unwrap_err();
    assert!(matches!(
        err,
        ConversionError::Allocation(AllocationError::OutOfMemory { .. })
    ));
    assert!(converter.tensor().is_none());
}

#[test]
fn test_invalidate_keeps_memory() {
    let arena = DeviceArena::new(Device::Cpu);
    let mut converter = FormatConverter::new(arena.clone());
    converter
        .convert(&Frame::solid(2, 2, &[1, 2, 3]).unwrap(), [0.0; 3])
        .unwrap();
    converter.invalidate();
    assert!(converter.tensor().is_none());
    assert_eq!(arena.live_buffers(), 1);
}

#[test]
fn test_short_sample_data_never_leaves_stale_pixels() {
    let mut converter = FormatConverter::new(DeviceArena::new(Device::Cpu));
    converter
        .convert(&Frame::solid(2, 2, &[0, 200, 0]).unwrap(), [0.0; 3])
        .unwrap();

    // shape claims 2x2 RGB, data holds a single pixel
    let short = Frame::U8(Tensor {
        shape: vec![2, 2, 3],
        data: vec![200, 0, 0],
    });
    assert!(matches!(
        converter.convert(&short, [0.0; 3]),
        Err(ConversionError::Malformed(_))
    ));
    assert!(converter.tensor().is_none());
}

#[test]
fn test_overflowing_shape_is_malformed() {
    let mut converter = FormatConverter::new(DeviceArena::new(Device::Cpu));
    let huge = Frame::U8(Tensor {
        shape: vec![usize::MAX / 4, 2, 3],
        data: vec![],
    });
    assert!(matches!(
        converter.convert(&huge, [0.0; 3]),
        Err(ConversionError::Malformed(_))
    ));
}
