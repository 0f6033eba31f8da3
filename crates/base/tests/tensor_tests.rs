use base::{Tensor, TensorError, element_count};

#[test]
fn test_tensor_new_valid() {
    let tensor = Tensor::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    assert_eq!(tensor.shape, vec![2, 3]);
    assert_eq!(tensor.len(), 6);
}

#[test]
fn test_tensor_new_shape_mismatch() {
    let result = Tensor::new(vec![2, 3], vec![1.0, 2.0, 3.0]);
    assert!(matches!(
        result,
        Err(TensorError::ShapeMismatch {
            expected: 6,
            got: 3
        })
    ));
}

#[test]
fn test_tensor_new_overflow() {
    let result = Tensor::<f32>::new(vec![usize::MAX, 2], vec![]);
    assert!(matches!(result, Err(TensorError::ShapeOverflow)));
}

#[test]
fn test_element_count_empty_shape_is_scalar() {
    assert_eq!(element_count(&[]).unwrap(), 1);
    assert_eq!(element_count(&[4, 0, 3]).unwrap(), 0);
}

#[test]
fn test_tensor_filled_and_zeros() {
    let ones = Tensor::filled(vec![2, 2], 1u8).unwrap();
    assert_eq!(ones.data, vec![1, 1, 1, 1]);
    let zeros = Tensor::<f32>::zeros(vec![3]).unwrap();
    assert_eq!(zeros.data, vec![0.0; 3]);
}

#[test]
fn test_tensor_dims() {
    let image = Tensor::<u8>::zeros(vec![4, 5, 3]).unwrap();
    assert_eq!(image.dims3().unwrap(), [4, 5, 3]);
    assert!(matches!(
        image.dims4(),
        Err(TensorError::Rank {
            expected: 4,
            got: 3
        })
    ));
}

#[test]
fn test_tensor_is_empty() {
    let empty = Tensor::<f32>::new(vec![0], vec![]).unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.ndim(), 1);
}
