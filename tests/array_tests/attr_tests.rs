//! Tests for named attributes

use dbarray::{ArrayError, ArrayHandle, AttrValue, MemoryBackend};
use tempfile::TempDir;

use crate::{memory_array, test_config};

#[test]
fn test_attr_scalars() {
    let mut array = ArrayHandle::with_backend(MemoryBackend::new()).unwrap();

    array.set_attr("int_attr", 42i64).unwrap();
    array.set_attr("flt_attr", 0.25f64).unwrap();
    array.set_attr("str_attr", "hello world").unwrap();

    assert_eq!(array.get_attr("int_attr").unwrap().unwrap().as_int(), Some(42));
    assert_eq!(array.get_attr("flt_attr").unwrap().unwrap().as_float(), Some(0.25));
    assert_eq!(
        array.get_attr("str_attr").unwrap().unwrap().as_str(),
        Some("hello world")
    );
    assert_eq!(array.get_attr("missing").unwrap(), None);
}

#[test]
fn test_attr_vector() {
    let mut array = memory_array(2, 3);
    let mean = [0.5f32, -1.25, 3.0];

    array.set_attr("data_mean", AttrValue::vector(&mean)).unwrap();

    let value = array.get_attr("data_mean").unwrap().unwrap();
    assert_eq!(value.as_vector::<f32>().unwrap(), mean.to_vec());
    assert!(matches!(
        value.as_vector::<f64>(),
        Err(ArrayError::Codec(_))
    ));
    assert!(matches!(
        AttrValue::Int(1).as_vector::<f32>(),
        Err(ArrayError::Codec(_))
    ));
}

#[test]
fn test_attrs_do_not_finalize_or_collide_with_rows() {
    let mut array = memory_array(2, 1);

    array.set_attr("note", "before data").unwrap();
    array.set_shape(3, 1).unwrap();

    array.set_row(0, &[1.0f32]).unwrap();
    array.set_attr("note", "after data").unwrap();

    assert_eq!(array.stored_rows().unwrap(), vec![0]);
    assert_eq!(array.attr_names().unwrap(), vec!["note".to_string()]);
    assert_eq!(
        array.get_attr("note").unwrap(),
        Some(AttrValue::Str("after data".to_string()))
    );
}

#[test]
fn test_attr_empty_name_rejected() {
    let mut array = ArrayHandle::with_backend(MemoryBackend::new()).unwrap();

    assert!(matches!(
        array.set_attr("", 1i64),
        Err(ArrayError::Validation(_))
    ));
    assert!(matches!(array.get_attr(""), Err(ArrayError::Validation(_))));
}

#[test]
fn test_attrs_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir, "attrs.db");

    {
        let mut array = ArrayHandle::open_with_config(&config).unwrap();
        array.set_attr("version", 3i64).unwrap();
        array.set_attr("labels", AttrValue::vector(&[1u8, 2, 3])).unwrap();
        array.close().unwrap();
    }

    let array = ArrayHandle::open_with_config(&config).unwrap();
    assert_eq!(
        array.attr_names().unwrap(),
        vec!["labels".to_string(), "version".to_string()]
    );
    assert_eq!(array.get_attr("version").unwrap(), Some(AttrValue::Int(3)));
    assert_eq!(
        array
            .get_attr("labels")
            .unwrap()
            .unwrap()
            .as_vector::<u8>()
            .unwrap(),
        vec![1, 2, 3]
    );
}
