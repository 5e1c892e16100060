use std::sync::Arc;

use axom_memory::space::Host;
use axom_memory::{allocator_id, register, HostResource, MemorySpace, PoolResource};
use axom_testing::{DropTracker, TestCases};

use super::{Array, DEFAULT_RESIZE_RATIO};
use crate::errors::{ExpandError, FromDataError};
use crate::prelude::*;
use crate::ArrayView;

#[test]
fn test_new() {
    let arr = Array::<f32, 2>::new([2, 3]);
    assert_eq!(arr.shape(), [2, 3]);
    assert_eq!(arr.strides(), [3, 1]);
    assert_eq!(arr.len(), 6);
    assert_eq!(arr.capacity(), 6);
    assert_eq!(arr.resize_ratio(), DEFAULT_RESIZE_RATIO);
    assert!(arr.iter().all(|x| *x == 0.));
    assert_eq!(arr.memory_space(), MemorySpace::Host);
}

#[test]
fn test_full() {
    let arr = Array::<i32, 3>::full([2, 2, 2], 7);
    assert_eq!(arr.strides(), [4, 2, 1]);
    assert_eq!(arr.to_vec(), [7; 8]);
}

#[test]
fn test_with_capacity() {
    let arr = Array::<u8, 2>::with_capacity([4, 5]);
    assert_eq!(arr.shape(), [0, 5]);
    assert_eq!(arr.capacity(), 20);
    assert!(arr.is_empty());
}

#[test]
fn test_default_does_not_allocate() {
    let arr = Array::<String>::default();
    assert_eq!(arr.shape(), [0]);
    assert_eq!(arr.capacity(), 0);
    assert!(arr.as_slice().is_empty());
}

#[test]
fn test_from_data() {
    let arr = Array::<i32, 2>::from_data([2, 3], (0..6).collect());
    assert_eq!(arr[[1, 2]], 5);
    assert_eq!(arr[[0, 0]], 0);
    assert_eq!(arr[4], 4);
    assert_eq!(arr.get([1, 0]), Some(&3));
    assert_eq!(arr.get([2, 0]), None);
    assert_eq!(arr.get_flat(6), None);

    assert_eq!(
        Array::<i32, 2>::try_from_data([2, 3], vec![1, 2]).err(),
        Some(FromDataError::StorageLengthMismatch)
    );
}

#[test]
fn test_from_data_shape_overflow() {
    // The element count wraps to a small value if computed unchecked.
    let wrapped = usize::MAX / 2 + 1;
    assert_eq!(
        Array::<u64, 2>::try_from_data([wrapped, 2], vec![]).err(),
        Some(FromDataError::StorageLengthMismatch)
    );
    assert_eq!(
        Array::<u64, 3>::try_from_data([0, usize::MAX, 2], vec![]).err(),
        Some(FromDataError::StorageLengthMismatch)
    );
}

#[test]
#[should_panic(expected = "capacity overflow for shape")]
fn test_new_shape_overflow() {
    Array::<u8, 2>::new([usize::MAX, 2]);
}

#[test]
#[should_panic(expected = "capacity overflow for shape")]
fn test_full_shape_overflow() {
    Array::<u8, 2>::full([2, usize::MAX], 1);
}

#[test]
#[should_panic(expected = "invalid array data: data length mismatch")]
fn test_from_data_wrong_len() {
    Array::<i32>::from_data([3], vec![1, 2]);
}

#[test]
#[should_panic(expected = "out of bounds for shape")]
fn test_index_out_of_bounds() {
    let arr = Array::<i32, 2>::from_data([2, 3], (0..6).collect());
    let _ = arr[[0, 3]];
}

#[test]
fn test_index_mut() {
    let mut arr = Array::<i32, 2>::new([2, 2]);
    arr[[0, 1]] = 1;
    arr[3] = 3;
    *arr.get_mut([1, 0]).unwrap() = 2;
    *arr.get_flat_mut(0).unwrap() = -1;
    assert_eq!(arr.as_slice(), &[-1, 1, 2, 3]);
}

#[test]
fn test_push_grows_by_resize_ratio() {
    let mut arr = Array::<i32>::from_data([3], vec![1, 2, 3]);
    assert_eq!(arr.capacity(), 3);
    let old_ptr = arr.as_ptr();

    arr.push(4);

    assert_eq!(arr.len(), 4);
    assert_eq!(arr.capacity(), 6);
    assert_ne!(arr.as_ptr(), old_ptr);
    assert_eq!(arr.as_slice(), &[1, 2, 3, 4]);

    // Pushes within capacity reuse the buffer.
    let ptr = arr.as_ptr();
    arr.push(5);
    arr.push(6);
    assert_eq!(arr.as_ptr(), ptr);
    assert_eq!(arr.capacity(), 6);
}

#[test]
fn test_growth() {
    #[derive(Debug)]
    struct Case {
        ratio: f64,
        initial: usize,
        pushes: usize,
        expected_capacity: usize,
    }

    let cases = [
        Case {
            ratio: 2.0,
            initial: 0,
            pushes: 1,
            expected_capacity: 1,
        },
        Case {
            ratio: 2.0,
            initial: 4,
            pushes: 1,
            expected_capacity: 8,
        },
        Case {
            ratio: 1.5,
            initial: 4,
            pushes: 1,
            expected_capacity: 6,
        },
        Case {
            ratio: 1.0,
            initial: 4,
            pushes: 3,
            expected_capacity: 7,
        },
    ];

    cases.test_each(|case| {
        let mut arr = Array::<u32>::new([case.initial]);
        arr.set_resize_ratio(case.ratio);
        for i in 0..case.pushes {
            arr.push(i as u32);
        }
        assert_eq!(arr.len(), case.initial + case.pushes);
        assert_eq!(arr.capacity(), case.expected_capacity);
    })
}

#[test]
#[should_panic(expected = "resize ratio of 0.5 does not allow the array to grow")]
fn test_resize_ratio_below_one_disables_growth() {
    let mut arr = Array::<i32>::from_data([2], vec![1, 2]);
    arr.set_resize_ratio(0.5);
    arr.push(3);
}

#[test]
fn test_reserve_ignores_resize_ratio() {
    let mut arr = Array::<i32>::from_data([2], vec![1, 2]);
    arr.set_resize_ratio(0.5);
    arr.reserve(5);
    arr.push(3);
    assert_eq!(arr.capacity(), 5);

    // Reserving less than the current capacity does nothing.
    arr.reserve(1);
    assert_eq!(arr.capacity(), 5);
}

#[test]
fn test_capacity_is_multiple_of_block() {
    let mut arr = Array::<i32, 2>::with_capacity([1, 3]);
    arr.reserve(4);
    assert_eq!(arr.capacity(), 6);

    arr.resize(3);
    assert_eq!(arr.shape(), [3, 3]);
    assert_eq!(arr.capacity() % 3, 0);
}

#[test]
fn test_len_within_capacity() {
    let mut arr = Array::<i32>::default();
    let mut prev_capacity = 0;
    for i in 0..100 {
        arr.push(i);
        assert!(arr.len() <= arr.capacity());
        assert!(arr.capacity() >= prev_capacity);
        prev_capacity = arr.capacity();
    }

    arr.erase_range(10..90);
    assert_eq!(arr.capacity(), prev_capacity);
    arr.shrink();
    assert_eq!(arr.capacity(), 20);
    assert_eq!(arr.len(), 20);
}

#[test]
fn test_shrink_empty() {
    let mut arr = Array::<i32>::from_data([3], vec![1, 2, 3]);
    arr.clear();
    arr.shrink();
    assert_eq!(arr.capacity(), 0);
    arr.push(1);
    assert_eq!(arr.as_slice(), &[1]);
}

#[test]
fn test_resize() {
    let mut arr = Array::<i32, 2>::from_data([1, 2], vec![1, 2]);
    arr.resize(3);
    assert_eq!(arr.shape(), [3, 2]);
    assert_eq!(arr.strides(), [2, 1]);
    assert_eq!(arr.to_vec(), [1, 2, 0, 0, 0, 0]);

    arr.resize_with_value(4, 9);
    assert_eq!(arr.to_vec(), [1, 2, 0, 0, 0, 0, 9, 9]);

    let capacity = arr.capacity();
    arr.resize(1);
    assert_eq!(arr.shape(), [1, 2]);
    assert_eq!(arr.to_vec(), [1, 2]);
    assert_eq!(arr.capacity(), capacity);
}

#[test]
fn test_resize_empty_rows() {
    let mut arr = Array::<i32, 2>::new([2, 0]);
    assert_eq!(arr.strides(), [0, 1]);

    arr.resize(5);
    assert_eq!(arr.shape(), [5, 0]);
    assert_eq!(arr.strides(), [0, 1]);
    assert!(arr.is_empty());

    arr.resize_with_value(7, 1);
    assert_eq!(arr.shape(), [7, 0]);
    assert_eq!(arr.len(), 0);

    arr.resize(1);
    assert_eq!(arr.shape(), [1, 0]);
    assert_eq!(arr.capacity(), 0);
}

#[test]
fn test_insert() {
    let mut arr = Array::<i32>::from_data([3], vec![1, 2, 3]);
    arr.insert(0, 0);
    arr.insert(2, 10);
    arr.insert(5, 4);
    assert_eq!(arr.as_slice(), &[0, 1, 10, 2, 3, 4]);

    arr.emplace(1, || 5);
    assert_eq!(arr.as_slice(), &[0, 5, 1, 10, 2, 3, 4]);

    arr.insert_slice(7, &[8, 9]);
    arr.insert_slice(0, &[]);
    assert_eq!(arr.as_slice(), &[0, 5, 1, 10, 2, 3, 4, 8, 9]);
}

#[test]
#[should_panic(expected = "insertion index (is 4) should be <= len (is 3)")]
fn test_insert_out_of_bounds() {
    let mut arr = Array::<i32>::from_data([3], vec![1, 2, 3]);
    arr.insert(4, 0);
}

#[test]
fn test_insert_from() {
    let mut arr = Array::<i32, 2>::from_data([2, 2], vec![1, 2, 5, 6]);
    let rows = Array::<i32, 2>::from_data([1, 2], vec![3, 4]);

    arr.insert_from(1, &rows);
    assert_eq!(arr.shape(), [3, 2]);
    assert_eq!(arr.strides(), [2, 1]);
    assert_eq!(arr.to_vec(), [1, 2, 3, 4, 5, 6]);

    arr.append(&rows.view());
    assert_eq!(arr.to_vec(), [1, 2, 3, 4, 5, 6, 3, 4]);
}

#[test]
fn test_insert_shape_mismatch() {
    let mut arr = Array::<f64, 2>::new([3, 4]);
    let other = Array::<f64, 2>::new([2, 5]);
    let ptr = arr.as_ptr();

    assert_eq!(
        arr.try_insert_from(0, &other),
        Err(ExpandError::ShapeMismatch)
    );
    assert_eq!(arr.shape(), [3, 4]);
    assert_eq!(arr.capacity(), 12);
    assert_eq!(arr.as_ptr(), ptr);
}

#[test]
#[should_panic(expected = "cannot insert an array of incompatible shape")]
fn test_insert_from_shape_mismatch_panics() {
    let mut arr = Array::<f64, 2>::new([3, 4]);
    arr.insert_from(0, &Array::<f64, 2>::new([2, 5]));
}

#[test]
fn test_erase() {
    let mut arr = Array::<i32, 2>::from_data([4, 2], (0..8).collect());
    arr.erase(1);
    assert_eq!(arr.shape(), [3, 2]);
    assert_eq!(arr.to_vec(), [0, 1, 4, 5, 6, 7]);

    arr.erase_range(0..2);
    assert_eq!(arr.to_vec(), [6, 7]);

    arr.erase_range(1..1);
    assert_eq!(arr.shape(), [1, 2]);
}

#[test]
#[should_panic(expected = "erase range 2..4 out of bounds for length 3")]
fn test_erase_out_of_bounds() {
    let mut arr = Array::<i32>::from_data([3], vec![1, 2, 3]);
    arr.erase_range(2..4);
}

#[test]
fn test_pop() {
    let mut arr: Array<i32> = (1..=3).collect();
    assert_eq!(arr.pop(), Some(3));
    assert_eq!(arr.pop(), Some(2));
    assert_eq!(arr.pop(), Some(1));
    assert_eq!(arr.pop(), None);
    assert_eq!(arr.capacity(), 3);
}

#[test]
fn test_extend() {
    let mut arr = Array::<i32>::from(vec![1]);
    arr.extend([2, 3, 4]);
    assert_eq!(arr.as_slice(), &[1, 2, 3, 4]);
    assert_eq!(arr.capacity(), 4);
    assert_eq!(arr.iter().copied().sum::<i32>(), 10);
    assert_eq!((&arr).into_iter().count(), 4);
}

#[test]
fn test_extend_reserves_exact() {
    let mut arr = Array::<i32>::from_data([4], vec![1, 2, 3, 4]);
    assert_eq!(arr.capacity(), 4);

    // The size hint is honored exactly, without applying the resize ratio.
    arr.extend([5]);
    assert_eq!(arr.as_slice(), &[1, 2, 3, 4, 5]);
    assert_eq!(arr.capacity(), 5);

    // Values beyond the size hint grow the array as `push` does.
    arr.extend((6..8).filter(|_| true));
    assert_eq!(arr.len(), 7);
    assert_eq!(arr.capacity(), 10);
}

#[test]
fn test_fill() {
    let mut arr = Array::<String, 2>::full([2, 2], "a".to_string());
    arr.fill("b".to_string());
    assert_eq!(arr.to_vec(), ["b", "b", "b", "b"]);

    let mut arr = Array::<f32>::new([100]);
    arr.fill_copy(2.5);
    assert!(arr.iter().all(|x| *x == 2.5));
}

#[test]
fn test_view_mut_writes_through() {
    let mut arr = Array::<i32, 2>::new([2, 2]);
    {
        let mut view = arr.view_mut();
        view[[1, 1]] = 4;
        view.as_mut_slice()[0] = 1;
    }
    assert_eq!(arr.to_vec(), [1, 0, 0, 4]);
}

#[test]
fn test_clone() {
    let arr = Array::<String>::from_data([2], vec!["x".into(), "y".into()]);
    let copy = arr.clone();
    assert_eq!(copy, arr);
    assert_ne!(copy.as_ptr(), arr.as_ptr());
    assert_eq!(copy.capacity(), arr.capacity());
}

#[test]
fn test_take_leaves_empty_array() {
    let mut arr = Array::<i32>::from_data([2], vec![1, 2]);
    let ptr = arr.as_ptr();
    let taken = std::mem::take(&mut arr);

    assert_eq!(taken.as_ptr(), ptr);
    assert_eq!(taken.as_slice(), &[1, 2]);
    assert!(arr.is_empty());
    assert_eq!(arr.capacity(), 0);
}

#[test]
fn test_eq() {
    let a = Array::<i32>::from_data([3], vec![1, 2, 3]);
    let b = Array::<i32>::from_data([3], vec![1, 2, 3]);
    let c = Array::<i32>::from_data([3], vec![1, 2, 4]);
    assert_eq!(a, b);
    assert_ne!(a, c);

    let data = [1, 2, 3];
    assert_eq!(a, ArrayView::<i32>::from_slice(&data, [3]));

    // Equal elements in a different shape.
    let d = Array::<i32, 2>::from_data([1, 3], vec![1, 2, 3]);
    let e = Array::<i32, 2>::from_data([3, 1], vec![1, 2, 3]);
    assert_ne!(d, e);
}

#[test]
fn test_drops_each_element_once() {
    let tracker = DropTracker::new();
    let items: Vec<_> = (0..6).map(|i| tracker.item(i)).collect();
    let mut arr = Array::<_, 2>::from_data([3, 2], items);

    arr.erase(0);
    assert_eq!(tracker.drops(), 2);

    let copy = arr.clone();
    arr.insert_from(0, &copy);
    assert_eq!(tracker.drops(), 2);
    assert_eq!(arr.len(), 8);

    arr.resize_with_value(2, tracker.item(-1));
    assert_eq!(tracker.drops(), 2 + 4 + 1);

    arr.clear();
    assert_eq!(tracker.drops(), 2 + 4 + 1 + 4);

    drop(arr);
    drop(copy);
    assert_eq!(tracker.drops(), 15);
}

#[test]
fn test_pop_moves_out() {
    let tracker = DropTracker::new();
    let mut arr: Array<_> = (0..3).map(|i| tracker.item(i)).collect();
    let last = arr.pop().unwrap();
    assert_eq!(last.value(), 2);
    assert_eq!(tracker.drops(), 0);

    drop(arr);
    assert_eq!(tracker.drops(), 2);
    drop(last);
    assert_eq!(tracker.drops(), 3);
}

#[test]
fn test_static_host_space() {
    let arr = Array::<i32, 1, Host>::from_data([2], vec![1, 2]);
    assert!(arr.is_host_accessible());
    assert_eq!(arr.allocator_id(), allocator_id(MemorySpace::Host));

    let dynamic = arr.to_space::<axom_memory::space::Dynamic>();
    assert_eq!(dynamic.allocator_id(), arr.allocator_id());
    assert_eq!(dynamic.as_slice(), arr.as_slice());
}

#[test]
fn test_pool_allocator() {
    let pool = register(Arc::new(PoolResource::new(Arc::new(HostResource::new()))));

    let mut arr = Array::<i64>::from_data_in(pool, [2], vec![1, 2]);
    assert_eq!(arr.allocator_id(), pool);
    assert_eq!(arr.memory_space(), MemorySpace::Host);
    for i in 3..=20 {
        arr.push(i);
    }
    assert_eq!(arr.to_vec(), (1..=20).collect::<Vec<_>>());

    let copy = arr.clone();
    assert_eq!(copy.allocator_id(), pool);
    assert_eq!(copy, arr);
}

#[cfg(feature = "device")]
mod device {
    use axom_memory::space::{Device, Dynamic, Host, Unified};
    use axom_memory::{allocator_id, MemorySpace};
    use axom_testing::DropTracker;

    use crate::prelude::*;
    use crate::Array;

    #[test]
    fn test_device_array() {
        let mut arr = Array::<i32, 2, Device>::from_data([2, 2], vec![1, 2, 3, 4]);
        assert!(!arr.is_host_accessible());
        assert_eq!(arr.memory_space(), MemorySpace::Device);
        assert_eq!(arr.allocator_id(), allocator_id(MemorySpace::Device));

        arr.resize(3);
        arr.erase(0);
        arr.fill_copy(5);
        assert_eq!(arr.shape(), [2, 2]);
        assert_eq!(arr.to_vec(), [5, 5, 5, 5]);

        let host: Array<i32, 2, Host> = arr.to_space();
        assert!(host.is_host_accessible());
        assert_eq!(host.as_slice(), &[5, 5, 5, 5]);

        let back: Array<i32, 2, Device> = host.to_space();
        assert_eq!(back, arr);
    }

    #[test]
    fn test_device_insert_from_host() {
        let mut arr = Array::<f32, 1, Device>::from_data([2], vec![1., 4.]);
        let host = Array::<f32>::from_data([2], vec![2., 3.]);
        arr.insert_from(1, &host);
        arr.push(5.);
        assert_eq!(arr.to_vec(), [1., 2., 3., 4., 5.]);
    }

    #[test]
    fn test_device_drops() {
        let tracker = DropTracker::new();
        let items: Vec<_> = (0..4).map(|i| tracker.item(i)).collect();
        let mut arr = Array::<_, 1, Device>::from_data([4], items);

        arr.erase(1);
        assert_eq!(tracker.drops(), 1);
        assert_eq!(arr.pop().map(|x| x.value()), Some(3));
        assert_eq!(tracker.drops(), 2);

        let values: Vec<_> = arr.to_vec().iter().map(|x| x.value()).collect();
        assert_eq!(values, [0, 2]);
        assert_eq!(tracker.drops(), 4);

        drop(arr);
        assert_eq!(tracker.drops(), 6);
    }

    #[test]
    fn test_dynamic_array_in_device_memory() {
        let device = allocator_id(MemorySpace::Device);
        let arr = Array::<u8, 1, Dynamic>::new_in(device, [3]);
        assert!(!arr.is_host_accessible());
        assert_eq!(arr.memory_space(), MemorySpace::Device);
        assert_eq!(arr.to_vec(), [0, 0, 0]);
    }

    #[test]
    fn test_unified_array_is_host_accessible() {
        let mut arr = Array::<u8, 1, Unified>::new([2]);
        assert!(arr.is_host_accessible());
        arr.as_mut_slice()[1] = 1;
        assert_eq!(arr.as_slice(), &[0, 1]);
    }

    #[test]
    #[should_panic(expected = "does not belong to the host memory space")]
    fn test_allocator_space_mismatch() {
        Array::<i32, 1, Host>::new_in(allocator_id(MemorySpace::Device), [2]);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "array data in the device memory space is not host-accessible")]
    fn test_index_device_array() {
        let arr = Array::<i32, 2, Device>::from_data([2, 2], vec![1, 2, 3, 4]);
        let _ = arr[[1, 1]];
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "not host-accessible")]
    fn test_device_array_as_slice() {
        let arr = Array::<i32, 1, Device>::from_data([2], vec![1, 2]);
        arr.as_slice();
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "not host-accessible")]
    fn test_device_array_get() {
        let arr = Array::<i32, 1, Device>::from_data([2], vec![1, 2]);
        arr.get([0]);
    }
}
