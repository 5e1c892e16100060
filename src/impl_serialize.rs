use std::fmt;
use std::marker::PhantomData;

use axom_memory::Space;
use serde::de::{Deserialize, Deserializer, Error, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::array_base::ArrayBase;
use crate::layout::NdLayout;
use crate::{Array, ArrayView};

/// Serialize an array as a struct with `shape` and `data` fields.
///
/// The data of memory which is not host-accessible is serialized from a
/// host copy.
fn serialize_array<A, Sr>(array: &A, serializer: Sr) -> Result<Sr::Ok, Sr::Error>
where
    A: ArrayBase,
    A::Elem: Serialize,
    Sr: Serializer,
{
    let mut state = serializer.serialize_struct("Array", 2)?;
    state.serialize_field("shape", array.shape().as_ref())?;

    // Safety: The array holds `len` live elements.
    unsafe {
        array
            .element_ops()
            .inspect(array.as_ptr(), array.len(), |data| {
                state.serialize_field("data", data)
            })?;
    }
    state.end()
}

impl<T: Serialize, const N: usize, S: Space> Serialize for Array<T, N, S> {
    fn serialize<Sr>(&self, serializer: Sr) -> Result<Sr::Ok, Sr::Error>
    where
        Sr: Serializer,
    {
        serialize_array(self, serializer)
    }
}

impl<T: Serialize, const N: usize, S: Space> Serialize for ArrayView<'_, T, N, S> {
    fn serialize<Sr>(&self, serializer: Sr) -> Result<Sr::Ok, Sr::Error>
    where
        Sr: Serializer,
    {
        serialize_array(self, serializer)
    }
}

struct ArrayVisitor<T, const N: usize, S> {
    marker: PhantomData<(T, S)>,
}

impl<'de, T, const N: usize, S> Visitor<'de> for ArrayVisitor<T, N, S>
where
    T: Deserialize<'de>,
    S: Space,
{
    type Value = Array<T, N, S>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "an array with \"shape\" and \"data\" fields")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut data: Option<Vec<T>> = None;
        let mut shape: Option<Vec<usize>> = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "data" => {
                    if data.is_some() {
                        return Err(A::Error::duplicate_field("data"));
                    }
                    data = Some(map.next_value()?);
                }
                "shape" => {
                    if shape.is_some() {
                        return Err(A::Error::duplicate_field("shape"));
                    }
                    shape = Some(map.next_value()?);
                }
                _ => {
                    return Err(A::Error::unknown_field(&key, &["data", "shape"]));
                }
            }
        }

        let Some(shape) = shape else {
            return Err(A::Error::missing_field("shape"));
        };
        let Some(data) = data else {
            return Err(A::Error::missing_field("data"));
        };

        let Ok(shape): Result<[usize; N], _> = shape.as_slice().try_into() else {
            return Err(A::Error::custom("incorrect shape length for array rank"));
        };

        Array::try_from_data(shape, data)
            .map_err(|_| A::Error::custom("data length does not match shape product"))
    }
}

/// Deserialize an array into the default allocator of its space.
impl<'de, T, const N: usize, S> Deserialize<'de> for Array<T, N, S>
where
    T: Deserialize<'de>,
    S: Space,
{
    fn deserialize<D>(deserializer: D) -> Result<Array<T, N, S>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_struct(
            "Array",
            &["shape", "data"],
            ArrayVisitor::<T, N, S> {
                marker: PhantomData,
            },
        )
    }
}
