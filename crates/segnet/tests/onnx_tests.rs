use frame::Frame;
use segnet::{
    Accelerator, Device, DeviceArena, FormatConverter, InferError, NetworkConfig, OnnxNetwork,
    onnx::pack_input,
};

#[test]
fn test_pack_input_is_planar_rgb() {
    let mut converter = FormatConverter::new(DeviceArena::new(Device::Cpu));
    let frame = Frame::rgba8(2, 1, vec![1, 2, 3, 99, 4, 5, 6, 99]).unwrap();
    let tensor = converter.convert(&frame, [0.0; 3]).unwrap();

    let packed = pack_input(tensor, 2, 1, [1.0, 2.0, 0.5]);
    assert_eq!(packed, vec![1.0, 4.0, 4.0, 10.0, 1.5, 3.0]);
}

#[test]
fn test_pack_input_resamples_nearest() {
    let mut converter = FormatConverter::new(DeviceArena::new(Device::Cpu));
    let frame = Frame::rgb8(4, 1, vec![10, 0, 0, 20, 0, 0, 30, 0, 0, 40, 0, 0]).unwrap();
    let tensor = converter.convert(&frame, [0.0; 3]).unwrap();

    let packed = pack_input(tensor, 2, 2, [1.0; 3]);
    // red plane, two rows of two
    assert_eq!(&packed[..4], &[10.0, 30.0, 10.0, 30.0]);
    assert!(packed[4..].iter().all(|&v| v == 0.0));
}

#[test]
fn test_missing_model_fails_to_load() {
    let config = NetworkConfig::builtin("fcn-resnet18-voc")
        .unwrap()
        .with_model_dir("/nonexistent");
    let err = OnnxNetwork::load(&config, &Device::Cpu).err().unwrap();
    assert!(matches!(err, InferError::ModelLoad(msg) if msg.contains("model file not found")));
}

#[test]
fn test_invalid_config_fails_before_loading() {
    let mut config = NetworkConfig::builtin("fcn-resnet18-voc").unwrap();
    config.num_classes = 0;
    assert!(matches!(
        OnnxNetwork::load(&config, &Device::Cpu),
        Err(InferError::Config(_))
    ));
}

#[cfg(not(feature = "cuda"))]
#[test]
fn test_cuda_requires_feature() {
    assert_eq!(
        Accelerator::cuda(0).err(),
        Some(InferError::UnsupportedDevice(Device::Cuda { ordinal: 0 }))
    );
}

#[test]
fn test_cpu_accelerator_synchronizes() {
    let accelerator = Accelerator::cpu();
    assert_eq!(accelerator.device(), &Device::Cpu);
    assert!(accelerator.synchronize().is_ok());
    assert_eq!(accelerator.arena().device(), &Device::Cpu);
}
